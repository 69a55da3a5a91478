//! Sharaf position entity - A role slot inside a sharaf definition (e.g. "HOF", "FM").
//!
//! Position names are unique within their definition.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sharaf position database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sharaf_positions")]
pub struct Model {
    /// Unique identifier for the position
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Definition this position belongs to
    pub sharaf_definition_id: i64,
    /// Position name, unique within the definition
    pub name: String,
    /// Sort order used when listing members
    pub display_order: i32,
    /// Maximum number of members per sharaf, `None` when unbounded
    pub capacity: Option<i32>,
}

/// Defines relationships between `SharafPosition` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each position belongs to one definition
    #[sea_orm(
        belongs_to = "super::sharaf_definition::Entity",
        from = "Column::SharafDefinitionId",
        to = "super::sharaf_definition::Column::Id"
    )]
    SharafDefinition,
    /// One position is held by many members
    #[sea_orm(has_many = "super::sharaf_member::Entity")]
    Members,
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

impl ActiveModelBehavior for ActiveModel {}
