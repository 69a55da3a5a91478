//! Definition mapping business logic - Creates, lists and deletes mapping edges.
//!
//! Mapping edges link two sharaf definitions from different miqaats. The set of edges must
//! stay an undirected forest: a new edge is rejected when the pair is already linked
//! directly (in either direction) or through any chain of existing edges. Deleting an edge
//! removes its sub-mappings and audit trail explicitly, children first, in one transaction.

use crate::{
    core::{catalog, graph::MappingGraph},
    entities::{
        DefinitionMapping, PaymentMapping, PositionMapping, ShiftAudit, definition_mapping,
        payment_mapping, position_mapping, shift_audit,
    },
    errors::{Error, Result},
};
use sea_orm::{Condition, QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

/// Rows removed by [`delete_mapping`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MappingDeletion {
    /// Position sub-mappings removed
    pub position_mappings: u64,
    /// Payment sub-mappings removed
    pub payment_mappings: u64,
    /// Shift audit rows removed
    pub shift_audits: u64,
}

/// Creates a mapping edge from `source_definition_id` to `target_definition_id`.
///
/// # Errors
/// * `NotFound` if either definition does not exist
/// * `InvalidEdge` if both ids are equal or both definitions belong to the same miqaat
/// * `DuplicateEdge` if the pair is already linked in either direction
/// * `CyclicEdge` if an existing chain of edges already connects the pair
#[instrument(skip(db, notes))]
pub async fn create_mapping(
    db: &DatabaseConnection,
    source_definition_id: i64,
    target_definition_id: i64,
    created_by: Option<String>,
    notes: Option<String>,
) -> Result<definition_mapping::Model> {
    let txn = db.begin().await?;

    let source = catalog::require_definition(&txn, source_definition_id).await?;
    let target = catalog::require_definition(&txn, target_definition_id).await?;

    if source.id == target.id {
        return Err(Error::InvalidEdge {
            message: format!("definition {} cannot be mapped to itself", source.id),
        });
    }
    if source.miqaat_id == target.miqaat_id {
        return Err(Error::InvalidEdge {
            message: format!(
                "definitions {} and {} both belong to miqaat {}",
                source.id, target.id, source.miqaat_id
            ),
        });
    }

    if let Some(existing) = find_mapping_between(&txn, source.id, target.id).await? {
        return Err(Error::DuplicateEdge {
            source_id: source.id,
            target_id: target.id,
            existing_id: existing.id,
        });
    }

    let mappings = DefinitionMapping::find().all(&txn).await?;
    let graph = MappingGraph::from_mappings(&mappings);
    debug!(edges = graph.edge_count(), "Checking mapping graph for cycles");
    if let Some(path) = graph.find_path(target.id, source.id) {
        warn!(
            source = source.id,
            target = target.id,
            ?path,
            "Rejected mapping that would close a cycle"
        );
        return Err(Error::CyclicEdge {
            source_id: source.id,
            target_id: target.id,
            path,
        });
    }

    let mapping = definition_mapping::ActiveModel {
        source_definition_id: Set(source.id),
        target_definition_id: Set(target.id),
        is_active: Set(true),
        notes: Set(notes),
        created_by: Set(created_by),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    info!(
        mapping = mapping.id,
        source = source.id,
        target = target.id,
        "Created definition mapping"
    );
    Ok(mapping)
}

/// Finds the mapping linking two definitions in either direction.
pub async fn find_mapping_between<C>(
    db: &C,
    a: i64,
    b: i64,
) -> Result<Option<definition_mapping::Model>>
where
    C: ConnectionTrait,
{
    DefinitionMapping::find()
        .filter(
            Condition::any()
                .add(
                    Condition::all()
                        .add(definition_mapping::Column::SourceDefinitionId.eq(a))
                        .add(definition_mapping::Column::TargetDefinitionId.eq(b)),
                )
                .add(
                    Condition::all()
                        .add(definition_mapping::Column::SourceDefinitionId.eq(b))
                        .add(definition_mapping::Column::TargetDefinitionId.eq(a)),
                ),
        )
        .one(db)
        .await
        .map_err(Into::into)
}

/// Deletes a mapping together with its sub-mappings and shift audits.
///
/// # Errors
/// Returns `NotFound` if the mapping does not exist.
#[instrument(skip(db))]
pub async fn delete_mapping(db: &DatabaseConnection, mapping_id: i64) -> Result<MappingDeletion> {
    let txn = db.begin().await?;

    let mapping = require_mapping(&txn, mapping_id).await?;

    let position_mappings = PositionMapping::delete_many()
        .filter(position_mapping::Column::DefinitionMappingId.eq(mapping.id))
        .exec(&txn)
        .await?
        .rows_affected;
    let payment_mappings = PaymentMapping::delete_many()
        .filter(payment_mapping::Column::DefinitionMappingId.eq(mapping.id))
        .exec(&txn)
        .await?
        .rows_affected;
    let shift_audits = ShiftAudit::delete_many()
        .filter(shift_audit::Column::DefinitionMappingId.eq(mapping.id))
        .exec(&txn)
        .await?
        .rows_affected;

    mapping.delete(&txn).await?;

    txn.commit().await?;

    info!(
        mapping = mapping_id,
        position_mappings, payment_mappings, shift_audits, "Deleted definition mapping"
    );
    Ok(MappingDeletion {
        position_mappings,
        payment_mappings,
        shift_audits,
    })
}

/// Lists mappings ordered by id, optionally only those touching `definition_id` on either side.
pub async fn list_mappings(
    db: &DatabaseConnection,
    definition_id: Option<i64>,
) -> Result<Vec<definition_mapping::Model>> {
    let mut query = DefinitionMapping::find();
    if let Some(definition_id) = definition_id {
        query = query.filter(
            Condition::any()
                .add(definition_mapping::Column::SourceDefinitionId.eq(definition_id))
                .add(definition_mapping::Column::TargetDefinitionId.eq(definition_id)),
        );
    }
    query
        .order_by_asc(definition_mapping::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a mapping by id.
pub async fn get_mapping<C>(db: &C, mapping_id: i64) -> Result<Option<definition_mapping::Model>>
where
    C: ConnectionTrait,
{
    DefinitionMapping::find_by_id(mapping_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Like [`get_mapping`] but fails with `NotFound` when the mapping is missing.
pub async fn require_mapping<C>(db: &C, mapping_id: i64) -> Result<definition_mapping::Model>
where
    C: ConnectionTrait,
{
    get_mapping(db, mapping_id)
        .await?
        .ok_or_else(|| Error::not_found("definition mapping", mapping_id))
}

/// Activates or deactivates a mapping. Inactive mappings cannot be shifted through.
#[instrument(skip(db))]
pub async fn set_mapping_active(
    db: &DatabaseConnection,
    mapping_id: i64,
    is_active: bool,
) -> Result<definition_mapping::Model> {
    let mapping = require_mapping(db, mapping_id).await?;
    let mut active_model: definition_mapping::ActiveModel = mapping.into();
    active_model.is_active = Set(is_active);
    let updated = active_model.update(db).await?;
    info!(mapping = mapping_id, is_active, "Updated mapping state");
    Ok(updated)
}

/// Replaces the free-text notes of a mapping.
pub async fn update_mapping_notes(
    db: &DatabaseConnection,
    mapping_id: i64,
    notes: Option<String>,
) -> Result<definition_mapping::Model> {
    let mapping = require_mapping(db, mapping_id).await?;
    let mut active_model: definition_mapping::ActiveModel = mapping.into();
    active_model.notes = Set(notes);
    active_model.update(db).await.map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::panic)]
    use super::*;
    use crate::core::sub_mapping;
    use crate::test_utils::*;

    /// Creates `count` definitions, each in its own miqaat.
    async fn definitions(db: &DatabaseConnection, count: usize) -> Result<Vec<i64>> {
        let mut ids = Vec::new();
        for i in 0..count {
            let event = create_test_miqaat(db, &format!("Miqaat {i}")).await?;
            let definition = create_test_definition(db, event.id, &format!("Def {i}")).await?;
            ids.push(definition.id);
        }
        Ok(ids)
    }

    #[tokio::test]
    async fn test_create_mapping_integration() -> Result<()> {
        let db = setup_test_db().await?;
        let ids = definitions(&db, 2).await?;

        let mapping = create_mapping(
            &db,
            ids[0],
            ids[1],
            Some("admin".to_string()),
            Some("1445 to 1446".to_string()),
        )
        .await?;

        assert_eq!(mapping.source_definition_id, ids[0]);
        assert_eq!(mapping.target_definition_id, ids[1]);
        assert!(mapping.is_active);
        assert_eq!(mapping.created_by.as_deref(), Some("admin"));
        assert_eq!(mapping.notes.as_deref(), Some("1445 to 1446"));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_mapping_unknown_definition() -> Result<()> {
        let db = setup_test_db().await?;
        let ids = definitions(&db, 1).await?;

        let result = create_mapping(&db, ids[0], 999, None, None).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_mapping_rejects_self_and_same_miqaat() -> Result<()> {
        let db = setup_test_db().await?;
        let event = create_test_miqaat(&db, "Ashara").await?;
        let first = create_test_definition(&db, event.id, "Majlis").await?;
        let second = create_test_definition(&db, event.id, "Niyaz").await?;

        let result = create_mapping(&db, first.id, first.id, None, None).await;
        assert!(matches!(result, Err(Error::InvalidEdge { .. })));

        let result = create_mapping(&db, first.id, second.id, None, None).await;
        assert!(matches!(result, Err(Error::InvalidEdge { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_mapping_rejects_duplicate_in_either_direction() -> Result<()> {
        let db = setup_test_db().await?;
        let ids = definitions(&db, 2).await?;
        let existing = create_mapping(&db, ids[0], ids[1], None, None).await?;

        let result = create_mapping(&db, ids[0], ids[1], None, None).await;
        assert!(matches!(
            result,
            Err(Error::DuplicateEdge { existing_id, .. }) if existing_id == existing.id
        ));

        let result = create_mapping(&db, ids[1], ids[0], None, None).await;
        assert!(matches!(result, Err(Error::DuplicateEdge { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_mapping_rejects_transitive_cycle() -> Result<()> {
        let db = setup_test_db().await?;
        let ids = definitions(&db, 4).await?;
        // A -> B, C -> B, C -> D: adding D -> A or A -> D closes an undirected cycle
        create_mapping(&db, ids[0], ids[1], None, None).await?;
        create_mapping(&db, ids[2], ids[1], None, None).await?;
        create_mapping(&db, ids[2], ids[3], None, None).await?;

        let result = create_mapping(&db, ids[3], ids[0], None, None).await;
        match result {
            Err(Error::CyclicEdge { path, .. }) => {
                assert_eq!(path, vec![ids[0], ids[1], ids[2], ids[3]]);
            }
            other => panic!("expected CyclicEdge, got {other:?}"),
        }

        let result = create_mapping(&db, ids[0], ids[3], None, None).await;
        assert!(matches!(result, Err(Error::CyclicEdge { .. })));

        assert_eq!(list_mappings(&db, None).await?.len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_mapping_between_components_succeeds() -> Result<()> {
        let db = setup_test_db().await?;
        let ids = definitions(&db, 4).await?;
        create_mapping(&db, ids[0], ids[1], None, None).await?;
        create_mapping(&db, ids[2], ids[3], None, None).await?;

        // Joining two separate trees keeps the graph acyclic
        create_mapping(&db, ids[1], ids[2], None, None).await?;
        assert_eq!(list_mappings(&db, None).await?.len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_mappings_filters_by_either_side() -> Result<()> {
        let db = setup_test_db().await?;
        let ids = definitions(&db, 3).await?;
        let first = create_mapping(&db, ids[0], ids[1], None, None).await?;
        let second = create_mapping(&db, ids[2], ids[1], None, None).await?;

        let touching_middle = list_mappings(&db, Some(ids[1])).await?;
        assert_eq!(touching_middle, vec![first.clone(), second]);

        let touching_first = list_mappings(&db, Some(ids[0])).await?;
        assert_eq!(touching_first, vec![first]);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_mapping_cascades_sub_mappings() -> Result<()> {
        let (db, fixture) = setup_with_mapping().await?;
        let hof = create_test_position(&db, fixture.source.id, "HOF").await?;
        let head = create_test_position(&db, fixture.target.id, "Head").await?;
        let niyaz = create_test_payment_definition(&db, fixture.source.id, "Niyaz").await?;
        let nazrana = create_test_payment_definition(&db, fixture.target.id, "Nazrana").await?;
        sub_mapping::add_position_mapping(&db, fixture.mapping.id, hof.id, head.id).await?;
        sub_mapping::add_payment_mapping(&db, fixture.mapping.id, niyaz.id, nazrana.id).await?;

        let deletion = delete_mapping(&db, fixture.mapping.id).await?;
        assert_eq!(deletion.position_mappings, 1);
        assert_eq!(deletion.payment_mappings, 1);
        assert_eq!(deletion.shift_audits, 0);

        assert!(get_mapping(&db, fixture.mapping.id).await?.is_none());
        assert!(PositionMapping::find().all(&db).await?.is_empty());
        assert!(PaymentMapping::find().all(&db).await?.is_empty());

        // The pair can be linked again once the edge is gone
        create_mapping(&db, fixture.target.id, fixture.source.id, None, None).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_mapping_not_found() -> Result<()> {
        let db = setup_test_db().await?;
        let result = delete_mapping(&db, 42).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_set_mapping_active_and_notes() -> Result<()> {
        let (db, fixture) = setup_with_mapping().await?;

        let updated = set_mapping_active(&db, fixture.mapping.id, false).await?;
        assert!(!updated.is_active);

        let updated =
            update_mapping_notes(&db, fixture.mapping.id, Some("paused".to_string())).await?;
        assert_eq!(updated.notes.as_deref(), Some("paused"));
        assert!(!updated.is_active);
        Ok(())
    }
}
