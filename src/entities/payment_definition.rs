//! Payment definition entity - A payment type required under a sharaf definition.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Payment definition database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payment_definitions")]
pub struct Model {
    /// Unique identifier for the payment definition
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Definition this payment type belongs to
    pub sharaf_definition_id: i64,
    /// Payment name, unique within the definition
    pub name: String,
    /// Optional free-text description
    pub description: Option<String>,
}

/// Defines relationships between `PaymentDefinition` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each payment definition belongs to one sharaf definition
    #[sea_orm(
        belongs_to = "super::sharaf_definition::Entity",
        from = "Column::SharafDefinitionId",
        to = "super::sharaf_definition::Column::Id"
    )]
    SharafDefinition,
    /// One payment definition has many recorded payments
    #[sea_orm(has_many = "super::sharaf_payment::Entity")]
    Payments,
}

impl Related<super::sharaf_definition::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SharafDefinition.def()
    }
}

impl Related<super::sharaf_payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
