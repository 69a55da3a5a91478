//! Definition mapping entity - A directed edge between two sharaf definitions.
//!
//! Edges form an undirected forest: at most one edge links any two definitions (in either
//! direction) and no sequence of edges may form a cycle. Position and payment sub-mappings
//! and the shift audit trail hang off the edge.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Definition mapping database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "definition_mappings")]
pub struct Model {
    /// Unique identifier for the mapping
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Definition sharafs are read from in a forward shift
    pub source_definition_id: i64,
    /// Definition sharafs are written to in a forward shift
    pub target_definition_id: i64,
    /// Inactive mappings cannot be used to shift
    pub is_active: bool,
    /// Free-text notes
    pub notes: Option<String>,
    /// Actor who created the mapping
    pub created_by: Option<String>,
    /// When the mapping was created
    pub created_at: DateTimeUtc,
}

impl Model {
    /// Returns `(source, target)` after applying the direction flag.
    #[must_use]
    pub const fn effective_definitions(&self, reverse: bool) -> (i64, i64) {
        if reverse {
            (self.target_definition_id, self.source_definition_id)
        } else {
            (self.source_definition_id, self.target_definition_id)
        }
    }
}

/// Defines relationships between `DefinitionMapping` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// The definition on the source side
    #[sea_orm(
        belongs_to = "super::sharaf_definition::Entity",
        from = "Column::SourceDefinitionId",
        to = "super::sharaf_definition::Column::Id"
    )]
    SourceDefinition,
    /// The definition on the target side
    #[sea_orm(
        belongs_to = "super::sharaf_definition::Entity",
        from = "Column::TargetDefinitionId",
        to = "super::sharaf_definition::Column::Id"
    )]
    TargetDefinition,
    /// One mapping has many position sub-mappings
    #[sea_orm(has_many = "super::position_mapping::Entity")]
    PositionMappings,
    /// One mapping has many payment sub-mappings
    #[sea_orm(has_many = "super::payment_mapping::Entity")]
    PaymentMappings,
    /// One mapping has many shift audit rows
    #[sea_orm(has_many = "super::shift_audit::Entity")]
    ShiftAudits,
}

impl Related<super::position_mapping::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PositionMappings.def()
    }
}

impl Related<super::payment_mapping::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentMappings.def()
    }
}

impl Related<super::shift_audit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ShiftAudits.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
