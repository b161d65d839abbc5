//! ReassignmentRequest entity model
//!
//! Proposes replacing an organization's primary contact. Approval replaces
//! the organization row wholesale; `organization_id` is repointed to the new
//! row before the old one is deleted so it never dangles.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Review state of a reassignment request. `pending` is the only state the
/// approval and rejection transitions accept.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    #[sea_orm(string_value = "pending")]
    #[default]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reassignment_requests")]
pub struct Model {
    /// Unique identifier for the request (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Organization whose primary contact is being replaced; repointed to
    /// the replacement organization on approval
    pub organization_id: Uuid,

    /// Email of the proposed new primary contact
    pub new_contact_email: String,

    /// Full replacement field set for the new organization row
    #[sea_orm(column_type = "JsonBinary")]
    pub new_organization_data: JsonValue,

    /// Optional contact attributes for a new-to-the-system contact
    #[sea_orm(column_type = "JsonBinary")]
    pub new_contact_data: Option<JsonValue>,

    pub status: RequestStatus,

    /// Admin who reviewed the request
    pub reviewed_by: Option<Uuid>,

    pub reviewed_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::organization::Entity",
        from = "Column::OrganizationId",
        to = "super::organization::Column::Id"
    )]
    Organization,
}

impl Related<super::organization::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organization.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
