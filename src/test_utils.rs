//! Shared test utilities.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults. Miqaats, definitions, positions and
//! payment definitions are inserted directly because the engine never creates them.

use crate::{
    core::{mapping, member, sharaf},
    entities::{
        definition_mapping, miqaat, payment_definition, sharaf_definition, sharaf_member,
        sharaf_position,
    },
    errors::Result,
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Inserts a miqaat.
pub async fn create_test_miqaat(db: &DatabaseConnection, name: &str) -> Result<miqaat::Model> {
    let model = miqaat::ActiveModel {
        name: Set(name.to_string()),
        ..Default::default()
    };
    Ok(model.insert(db).await?)
}

/// Inserts a sharaf definition under the given miqaat.
pub async fn create_test_definition(
    db: &DatabaseConnection,
    miqaat_id: i64,
    name: &str,
) -> Result<sharaf_definition::Model> {
    let model = sharaf_definition::ActiveModel {
        miqaat_id: Set(miqaat_id),
        name: Set(name.to_string()),
        description: Set(None),
        ..Default::default()
    };
    Ok(model.insert(db).await?)
}

/// Inserts a position with display order 1 and no capacity limit.
pub async fn create_test_position(
    db: &DatabaseConnection,
    definition_id: i64,
    name: &str,
) -> Result<sharaf_position::Model> {
    create_custom_position(db, definition_id, name, 1).await
}

/// Inserts a position with a custom display order.
pub async fn create_custom_position(
    db: &DatabaseConnection,
    definition_id: i64,
    name: &str,
    display_order: i32,
) -> Result<sharaf_position::Model> {
    let model = sharaf_position::ActiveModel {
        sharaf_definition_id: Set(definition_id),
        name: Set(name.to_string()),
        display_order: Set(display_order),
        capacity: Set(None),
        ..Default::default()
    };
    Ok(model.insert(db).await?)
}

/// Inserts a payment definition.
pub async fn create_test_payment_definition(
    db: &DatabaseConnection,
    definition_id: i64,
    name: &str,
) -> Result<payment_definition::Model> {
    let model = payment_definition::ActiveModel {
        sharaf_definition_id: Set(definition_id),
        name: Set(name.to_string()),
        description: Set(None),
        ..Default::default()
    };
    Ok(model.insert(db).await?)
}

/// Creates a sharaf at an explicit rank.
///
/// # Defaults
/// * `hof_id`: `"HOF-<rank>"`
/// * `capacity`: 4
pub async fn create_test_sharaf(
    db: &DatabaseConnection,
    definition_id: i64,
    rank: i32,
) -> Result<crate::entities::sharaf::Model> {
    sharaf::create_sharaf(
        db,
        definition_id,
        format!("HOF-{rank}"),
        Some(rank),
        4,
        None,
    )
    .await
}

/// Adds a member with an auto-assigned sequence and returns the stored row.
pub async fn create_test_member(
    db: &DatabaseConnection,
    sharaf_id: i64,
    position_id: i64,
    its_id: &str,
) -> Result<sharaf_member::Model> {
    let addition = member::add_member(db, sharaf_id, position_id, its_id.to_string(), None).await?;
    Ok(addition.member)
}

/// Two definitions in different miqaats linked by an active mapping.
pub struct MappingFixture {
    /// Source side of the mapping
    pub source: sharaf_definition::Model,
    /// Target side of the mapping
    pub target: sharaf_definition::Model,
    /// The mapping itself
    pub mapping: definition_mapping::Model,
}

/// Sets up a test database with a [`MappingFixture`].
pub async fn setup_with_mapping() -> Result<(DatabaseConnection, MappingFixture)> {
    let db = setup_test_db().await?;
    let first = create_test_miqaat(&db, "Ashara 1445").await?;
    let second = create_test_miqaat(&db, "Ashara 1446").await?;
    let source = create_test_definition(&db, first.id, "Majlis 1445").await?;
    let target = create_test_definition(&db, second.id, "Majlis 1446").await?;
    let mapping = mapping::create_mapping(
        &db,
        source.id,
        target.id,
        Some("test_user".to_string()),
        None,
    )
    .await?;
    Ok((
        db,
        MappingFixture {
            source,
            target,
            mapping,
        },
    ))
}
