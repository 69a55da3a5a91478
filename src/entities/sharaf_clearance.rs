//! Sharaf clearance entity - Clearance of a household head for a sharaf.
//!
//! Clearances reference the sharaf by id only, so they survive a shift without mutation.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sharaf clearance database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sharaf_clearances")]
pub struct Model {
    /// Unique identifier for the clearance row
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Sharaf being cleared
    pub sharaf_id: i64,
    /// ITS key of the household head
    pub hof_id: String,
    /// Whether clearance has been granted
    pub is_cleared: bool,
    /// Who granted or revoked the clearance
    pub cleared_by: Option<String>,
    /// When the clearance was last changed
    pub cleared_at: Option<DateTimeUtc>,
}

/// Defines relationships between `SharafClearance` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each clearance belongs to one sharaf
    #[sea_orm(
        belongs_to = "super::sharaf::Entity",
        from = "Column::SharafId",
        to = "super::sharaf::Column::Id"
    )]
    Sharaf,
}

impl Related<super::sharaf::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sharaf.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
