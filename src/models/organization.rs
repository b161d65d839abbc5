//! Organization entity model
//!
//! The member institution record. `name` is unique; the reassignment
//! workflow swaps which row owns a name via a two-phase temporary rename.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::{Date, DateTimeWithTimeZone};
use serde::{Deserialize, Serialize};

/// Membership lifecycle state of an organization.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    #[sea_orm(string_value = "pending")]
    #[default]
    Pending,
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "expired")]
    Expired,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "organizations")]
pub struct Model {
    /// Unique identifier for the organization (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Institution name, unique across all organizations
    #[sea_orm(unique)]
    pub name: String,

    pub address: Option<String>,

    pub city: Option<String>,

    pub state: Option<String>,

    pub postal_code: Option<String>,

    pub website: Option<String>,

    pub phone: Option<String>,

    /// Student enrollment headcount
    pub enrollment_size: Option<i32>,

    pub membership_status: MembershipStatus,

    /// Date the membership became active
    pub membership_start_date: Option<Date>,

    /// Annual membership fee in whole dollars
    pub annual_fee: Option<i32>,

    /// Primary contact; references profiles.id
    pub contact_person_id: Uuid,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::profile::Entity",
        from = "Column::ContactPersonId",
        to = "super::profile::Column::Id"
    )]
    ContactPerson,
}

impl Related<super::profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ContactPerson.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
