//! Sharaf payment entity - Paid/unpaid state of one payment definition for one sharaf.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sharaf payment database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sharaf_payments")]
pub struct Model {
    /// Unique identifier for the payment row
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Sharaf the payment belongs to
    pub sharaf_id: i64,
    /// Payment type being tracked
    pub payment_definition_id: i64,
    /// Whether the payment has been received
    pub payment_status: bool,
}

/// Defines relationships between `SharafPayment` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each payment belongs to one sharaf
    #[sea_orm(
        belongs_to = "super::sharaf::Entity",
        from = "Column::SharafId",
        to = "super::sharaf::Column::Id"
    )]
    Sharaf,
    /// Each payment tracks one payment definition
    #[sea_orm(
        belongs_to = "super::payment_definition::Entity",
        from = "Column::PaymentDefinitionId",
        to = "super::payment_definition::Column::Id"
    )]
    PaymentDefinition,
}

impl Related<super::sharaf::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sharaf.def()
    }
}

impl Related<super::payment_definition::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentDefinition.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
