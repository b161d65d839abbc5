//! # Data Models
//!
//! SeaORM entity models for the Membership API tables.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod custom_software_entry;
pub mod invoice;
pub mod organization;
pub mod organization_invitation;
pub mod organization_profile_edit_request;
pub mod pending_registration;
pub mod profile;
pub mod reassignment_request;
pub mod user_role;

pub use custom_software_entry::Entity as CustomSoftwareEntry;
pub use invoice::Entity as Invoice;
pub use organization::Entity as Organization;
pub use organization_invitation::Entity as OrganizationInvitation;
pub use organization_profile_edit_request::Entity as OrganizationProfileEditRequest;
pub use pending_registration::Entity as PendingRegistration;
pub use profile::Entity as Profile;
pub use reassignment_request::Entity as ReassignmentRequest;
pub use user_role::Entity as UserRole;

/// Basic service information returned by the root endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// Service name
    pub name: String,
    /// Service version
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            name: "membership-api".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
