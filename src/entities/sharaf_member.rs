//! Sharaf member entity - A person holding one position inside one sharaf.
//!
//! A person appears at most once per sharaf; holding memberships in several sharafs is
//! allowed and only reported as a warning when the membership is added.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sharaf member database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sharaf_members")]
pub struct Model {
    /// Unique identifier for the membership
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Sharaf the member belongs to
    pub sharaf_id: i64,
    /// Position held inside the sharaf
    pub sharaf_position_id: i64,
    /// ITS key of the person
    pub its_id: String,
    /// Ordering key within the (sharaf, position) group
    pub sequence: i32,
    /// Optional cached display name
    pub name: Option<String>,
}

/// Defines relationships between `SharafMember` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each member belongs to one sharaf
    #[sea_orm(
        belongs_to = "super::sharaf::Entity",
        from = "Column::SharafId",
        to = "super::sharaf::Column::Id"
    )]
    Sharaf,
    /// Each member holds one position
    #[sea_orm(
        belongs_to = "super::sharaf_position::Entity",
        from = "Column::SharafPositionId",
        to = "super::sharaf_position::Column::Id"
    )]
    SharafPosition,
}

impl Related<super::sharaf::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sharaf.def()
    }
}

impl Related<super::sharaf_position::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SharafPosition.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
