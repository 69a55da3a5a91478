//! Sub-mapping business logic - Position and payment correspondences under one mapping.
//!
//! Sub-mappings are always stored in the orientation of their mapping edge: the source
//! column refers to a row of the edge's source definition and the target column to a row of
//! its target definition. Under one edge each source id and each target id appears at most
//! once, which keeps the lookup invertible for reverse shifts.

use crate::{
    core::{catalog, mapping::require_mapping},
    entities::{PaymentMapping, PositionMapping, definition_mapping, payment_mapping, position_mapping},
    errors::{Error, Result},
};
use sea_orm::{Condition, QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{info, instrument};

/// Maps a position of the edge's source definition to a position of its target definition.
///
/// # Errors
/// * `NotFound` if the mapping or either position does not exist
/// * `InvalidArgument` if the ids are equal or a position belongs to the wrong definition
/// * `DuplicateSubMapping` if either position is already mapped under this edge
#[instrument(skip(db))]
pub async fn add_position_mapping(
    db: &DatabaseConnection,
    mapping_id: i64,
    source_position_id: i64,
    target_position_id: i64,
) -> Result<position_mapping::Model> {
    let txn = db.begin().await?;

    let mapping = require_mapping(&txn, mapping_id).await?;
    reject_same_id("position", source_position_id, target_position_id)?;

    let source = catalog::require_position(&txn, source_position_id).await?;
    let target = catalog::require_position(&txn, target_position_id).await?;
    check_ownership(
        &mapping,
        "position",
        (source.id, source.sharaf_definition_id),
        (target.id, target.sharaf_definition_id),
    )?;

    let existing = PositionMapping::find()
        .filter(position_mapping::Column::DefinitionMappingId.eq(mapping.id))
        .filter(
            Condition::any()
                .add(position_mapping::Column::SourcePositionId.eq(source.id))
                .add(position_mapping::Column::TargetPositionId.eq(target.id)),
        )
        .one(&txn)
        .await?;
    if let Some(existing) = existing {
        return Err(Error::DuplicateSubMapping {
            message: format!(
                "position {} or {} is already mapped by sub-mapping {} ({} -> {})",
                source.id,
                target.id,
                existing.id,
                existing.source_position_id,
                existing.target_position_id
            ),
        });
    }

    let created = position_mapping::ActiveModel {
        definition_mapping_id: Set(mapping.id),
        source_position_id: Set(source.id),
        target_position_id: Set(target.id),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    info!(
        mapping = mapping.id,
        source = %source.name,
        target = %target.name,
        "Added position mapping"
    );
    Ok(created)
}

/// Maps a payment definition of the edge's source definition to one of its target definition.
///
/// # Errors
/// Same taxonomy as [`add_position_mapping`].
#[instrument(skip(db))]
pub async fn add_payment_mapping(
    db: &DatabaseConnection,
    mapping_id: i64,
    source_payment_definition_id: i64,
    target_payment_definition_id: i64,
) -> Result<payment_mapping::Model> {
    let txn = db.begin().await?;

    let mapping = require_mapping(&txn, mapping_id).await?;
    reject_same_id(
        "payment definition",
        source_payment_definition_id,
        target_payment_definition_id,
    )?;

    let source = catalog::require_payment_definition(&txn, source_payment_definition_id).await?;
    let target = catalog::require_payment_definition(&txn, target_payment_definition_id).await?;
    check_ownership(
        &mapping,
        "payment definition",
        (source.id, source.sharaf_definition_id),
        (target.id, target.sharaf_definition_id),
    )?;

    let existing = PaymentMapping::find()
        .filter(payment_mapping::Column::DefinitionMappingId.eq(mapping.id))
        .filter(
            Condition::any()
                .add(payment_mapping::Column::SourcePaymentDefinitionId.eq(source.id))
                .add(payment_mapping::Column::TargetPaymentDefinitionId.eq(target.id)),
        )
        .one(&txn)
        .await?;
    if let Some(existing) = existing {
        return Err(Error::DuplicateSubMapping {
            message: format!(
                "payment definition {} or {} is already mapped by sub-mapping {} ({} -> {})",
                source.id,
                target.id,
                existing.id,
                existing.source_payment_definition_id,
                existing.target_payment_definition_id
            ),
        });
    }

    let created = payment_mapping::ActiveModel {
        definition_mapping_id: Set(mapping.id),
        source_payment_definition_id: Set(source.id),
        target_payment_definition_id: Set(target.id),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    info!(
        mapping = mapping.id,
        source = %source.name,
        target = %target.name,
        "Added payment mapping"
    );
    Ok(created)
}

/// Removes a position sub-mapping.
///
/// # Errors
/// Returns `NotFound` if the sub-mapping does not exist.
pub async fn remove_position_mapping(db: &DatabaseConnection, id: i64) -> Result<()> {
    let result = PositionMapping::delete_by_id(id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::not_found("position mapping", id));
    }
    info!(id, "Removed position mapping");
    Ok(())
}

/// Removes a payment sub-mapping.
///
/// # Errors
/// Returns `NotFound` if the sub-mapping does not exist.
pub async fn remove_payment_mapping(db: &DatabaseConnection, id: i64) -> Result<()> {
    let result = PaymentMapping::delete_by_id(id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::not_found("payment mapping", id));
    }
    info!(id, "Removed payment mapping");
    Ok(())
}

/// Lists the position sub-mappings of a mapping ordered by id.
pub async fn list_position_mappings<C>(
    db: &C,
    mapping_id: i64,
) -> Result<Vec<position_mapping::Model>>
where
    C: ConnectionTrait,
{
    PositionMapping::find()
        .filter(position_mapping::Column::DefinitionMappingId.eq(mapping_id))
        .order_by_asc(position_mapping::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Lists the payment sub-mappings of a mapping ordered by id.
pub async fn list_payment_mappings<C>(
    db: &C,
    mapping_id: i64,
) -> Result<Vec<payment_mapping::Model>>
where
    C: ConnectionTrait,
{
    PaymentMapping::find()
        .filter(payment_mapping::Column::DefinitionMappingId.eq(mapping_id))
        .order_by_asc(payment_mapping::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

fn reject_same_id(kind: &str, source_id: i64, target_id: i64) -> Result<()> {
    if source_id == target_id {
        return Err(Error::invalid_argument(format!(
            "source and target {kind} must differ (both {source_id})"
        )));
    }
    Ok(())
}

/// `source` and `target` are `(row id, owning definition id)` pairs.
fn check_ownership(
    mapping: &definition_mapping::Model,
    kind: &str,
    source: (i64, i64),
    target: (i64, i64),
) -> Result<()> {
    if source.1 != mapping.source_definition_id {
        return Err(Error::invalid_argument(format!(
            "{kind} {} belongs to definition {}, not the mapping's source definition {}",
            source.0, source.1, mapping.source_definition_id
        )));
    }
    if target.1 != mapping.target_definition_id {
        return Err(Error::invalid_argument(format!(
            "{kind} {} belongs to definition {}, not the mapping's target definition {}",
            target.0, target.1, mapping.target_definition_id
        )));
    }
    Ok(())
}
