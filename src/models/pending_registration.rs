//! PendingRegistration entity model
//!
//! A prospective member's self-submitted application. Only the approval
//! workflow mutates `approval_status`; the stored password is handed to the
//! Identity Provider at approval time and cleared afterwards.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Approval state of a registration.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    #[sea_orm(string_value = "pending")]
    #[default]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

/// Review priority assigned by admins.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    Default,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum PriorityLevel {
    #[sea_orm(string_value = "low")]
    Low,
    #[sea_orm(string_value = "normal")]
    #[default]
    Normal,
    #[sea_orm(string_value = "high")]
    High,
    #[sea_orm(string_value = "urgent")]
    Urgent,
}

impl PriorityLevel {
    /// Sort weight, highest priority first.
    pub fn weight(&self) -> i32 {
        match self {
            PriorityLevel::Urgent => 3,
            PriorityLevel::High => 2,
            PriorityLevel::Normal => 1,
            PriorityLevel::Low => 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pending_registrations")]
pub struct Model {
    /// Unique identifier for the registration (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Registrant's email; becomes the Identity Provider login
    pub email: String,

    pub first_name: String,

    pub last_name: String,

    pub phone: Option<String>,

    pub title: Option<String>,

    /// Registrant-chosen credential, cleared once the identity exists
    #[serde(skip_serializing)]
    pub password: Option<String>,

    pub organization_name: String,

    pub organization_address: Option<String>,

    pub organization_city: Option<String>,

    pub organization_state: Option<String>,

    pub organization_postal_code: Option<String>,

    pub organization_website: Option<String>,

    pub enrollment_size: Option<i32>,

    pub approval_status: ApprovalStatus,

    pub priority_level: PriorityLevel,

    /// Reason recorded when an admin rejects the registration
    pub rejection_reason: Option<String>,

    /// Admin who approved the registration
    pub approved_by: Option<Uuid>,

    pub approved_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
