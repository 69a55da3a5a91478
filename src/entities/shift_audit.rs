//! Shift audit entity - One immutable row per successful shift.
//!
//! The list-valued parts of the audit (moved sharaf ids, exercised sub-mappings and rank
//! changes) are stored as JSON columns; `core::shift::AuditEntry` decodes them.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Shift audit database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "shift_audits")]
pub struct Model {
    /// Unique identifier for the audit row
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Mapping the shift ran through
    pub definition_mapping_id: i64,
    /// Actor who ran the shift
    pub shifted_by: Option<String>,
    /// Number of sharafs moved
    pub sharafs_moved: i32,
    /// Number of members carried along
    pub members_moved: i32,
    /// Number of clearances carried along
    pub clearances_moved: i32,
    /// Number of payments carried along
    pub payments_moved: i32,
    /// Whether the mapping was traversed target to source
    pub reverse_direction: bool,
    /// Ids of the moved sharafs
    #[sea_orm(column_type = "Json")]
    pub sharaf_ids: Json,
    /// Position sub-mappings that were exercised
    #[sea_orm(column_type = "Json")]
    pub position_mappings_used: Json,
    /// Payment sub-mappings that were exercised
    #[sea_orm(column_type = "Json")]
    pub payment_mappings_used: Json,
    /// Rank changes applied to moved and renumbered sharafs
    #[sea_orm(column_type = "Json")]
    pub rank_changes: Json,
    /// When the shift was committed
    pub created_at: DateTimeUtc,
}

/// Defines relationships between `ShiftAudit` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each audit row belongs to one definition mapping
    #[sea_orm(
        belongs_to = "super::definition_mapping::Entity",
        from = "Column::DefinitionMappingId",
        to = "super::definition_mapping::Column::Id"
    )]
    DefinitionMapping,
}

impl Related<super::definition_mapping::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DefinitionMapping.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
