//! Ownership-scoped resource services
//!
//! Each service performs CRUD against the document store with every query
//! filtered by the authenticated doctor's identity. Identity arrives as an
//! explicit `AuthedDoctor` parameter from the auth gate, never from payloads.

pub mod appointments;
pub mod patients;

pub use appointments::{
    AppointmentService, AppointmentUpdate, AppointmentWithPatient, NewAppointment,
};
pub use patients::{NewPatient, PatientService, PatientUpdate};
