//! Document schemas for the clinic API

pub mod appointment;
pub mod doctor;
pub mod metadata;
pub mod patient;

pub use appointment::{AppointmentDoc, AppointmentStatus, APPOINTMENT_COLLECTION};
pub use doctor::{normalize_email, DoctorDoc, DOCTOR_COLLECTION};
pub use metadata::Metadata;
pub use patient::{PatientDoc, AGE_MAX, AGE_MIN, PATIENT_COLLECTION};
