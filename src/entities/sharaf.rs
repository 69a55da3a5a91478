//! Sharaf entity - An allocation unit under one sharaf definition.
//!
//! Each sharaf has a rank that is unique within its definition, the key of the household
//! head it is allocated to, and a lifecycle status. A shift rewrites `sharaf_definition_id`
//! and `rank`; everything else is left untouched by the mapping subsystem.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a sharaf.
///
/// The direct setter accepts any transition; only the confirmation evaluator applies the
/// clearance-and-payment rule before moving a sharaf to `Confirmed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum SharafStatus {
    /// Newly allocated, awaiting approval
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Approved by the BS committee
    #[sea_orm(string_value = "bs_approved")]
    BsApproved,
    /// Cleared and fully paid
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    /// Rejected by an administrator
    #[sea_orm(string_value = "rejected")]
    Rejected,
    /// Cancelled by an administrator
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl SharafStatus {
    /// Stored string form of the status
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::BsApproved => "bs_approved",
            Self::Confirmed => "confirmed",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for SharafStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sharaf database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sharafs")]
pub struct Model {
    /// Unique identifier for the sharaf
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Definition the sharaf is currently allocated under
    pub sharaf_definition_id: i64,
    /// Position in the definition's ordering, unique within the definition
    pub rank: i32,
    /// Number of people the sharaf accommodates
    pub capacity: i32,
    /// Optional display name
    pub name: Option<String>,
    /// ITS key of the household head the sharaf is allocated to
    pub hof_id: String,
    /// Current lifecycle status
    pub status: SharafStatus,
    /// When the sharaf was created
    pub created_at: DateTimeUtc,
    /// When the sharaf was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Sharaf and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each sharaf belongs to one definition
    #[sea_orm(
        belongs_to = "super::sharaf_definition::Entity",
        from = "Column::SharafDefinitionId",
        to = "super::sharaf_definition::Column::Id"
    )]
    SharafDefinition,
    /// One sharaf has many members
    #[sea_orm(has_many = "super::sharaf_member::Entity")]
    Members,
    /// One sharaf has many payments
    #[sea_orm(has_many = "super::sharaf_payment::Entity")]
    Payments,
    /// One sharaf has many clearances
    #[sea_orm(has_many = "super::sharaf_clearance::Entity")]
    Clearances,
}

impl Related<super::sharaf_definition::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SharafDefinition.def()
    }
}

impl Related<super::sharaf_member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl Related<super::sharaf_payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl Related<super::sharaf_clearance::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Clearances.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
