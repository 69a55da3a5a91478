//! Sharaf definition entity - A named role schema scoped to one miqaat.
//!
//! A definition owns its positions and payment definitions. Sharafs are allocated under
//! exactly one definition at a time and move between definitions only through a shift.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sharaf definition database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sharaf_definitions")]
pub struct Model {
    /// Unique identifier for the definition
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Parent miqaat
    pub miqaat_id: i64,
    /// Display name (e.g. "Majlis Sharaf")
    pub name: String,
    /// Optional free-text description
    pub description: Option<String>,
}

/// Defines relationships between `SharafDefinition` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each definition belongs to one miqaat
    #[sea_orm(
        belongs_to = "super::miqaat::Entity",
        from = "Column::MiqaatId",
        to = "super::miqaat::Column::Id"
    )]
    Miqaat,
    /// One definition has many positions
    #[sea_orm(has_many = "super::sharaf_position::Entity")]
    Positions,
    /// One definition has many payment definitions
    #[sea_orm(has_many = "super::payment_definition::Entity")]
    PaymentDefinitions,
    /// One definition has many sharafs
    #[sea_orm(has_many = "super::sharaf::Entity")]
    Sharafs,
}

impl Related<super::miqaat::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Miqaat.def()
    }
}

impl Related<super::sharaf_position::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Positions.def()
    }
}

impl Related<super::payment_definition::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentDefinitions.def()
    }
}

impl Related<super::sharaf::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sharafs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
