//! Miqaat entity - The parent event that owns one or more sharaf definitions.
//!
//! Miqaats are created by collaborator CRUD code; this crate only reads them to enforce
//! that a definition mapping always links definitions of two different miqaats.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Miqaat database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "miqaats")]
pub struct Model {
    /// Unique identifier for the miqaat
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name of the event (e.g. "Ashara 1446")
    pub name: String,
}

/// Defines relationships between Miqaat and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One miqaat has many sharaf definitions
    #[sea_orm(has_many = "super::sharaf_definition::Entity")]
    SharafDefinitions,
}

impl Related<super::sharaf_definition::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SharafDefinitions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
