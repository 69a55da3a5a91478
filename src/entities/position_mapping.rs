//! Position mapping entity - Pairs a source-definition position with a target-definition
//! position under one definition mapping. Injective in both directions per mapping.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Position mapping database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "position_mappings")]
pub struct Model {
    /// Unique identifier for the sub-mapping
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning definition mapping
    pub definition_mapping_id: i64,
    /// Position in the mapping's source definition
    pub source_position_id: i64,
    /// Position in the mapping's target definition
    pub target_position_id: i64,
}

/// Defines relationships between `PositionMapping` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each sub-mapping belongs to one definition mapping
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
