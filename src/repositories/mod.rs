//! # Repositories
//!
//! Data-access layer. Each repository borrows a [`sea_orm::DatabaseConnection`]
//! and exposes the queries and mutations one table family needs; workflow
//! sequencing lives in the orchestrators, not here.

pub mod organization;
pub mod pending_registration;
pub mod profile;
pub mod reassignment_request;

pub use organization::{NewOrganization, OrganizationRepository};
pub use pending_registration::{NewRegistration, PendingRegistrationRepository};
pub use profile::{NewProfile, ProfileRepository};
pub use reassignment_request::{NewReassignmentRequest, ReassignmentRequestRepository};
