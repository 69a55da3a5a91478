//! Sharaf lifecycle business logic.
//!
//! Two separate paths change a sharaf's status. [`set_status`] is an unconstrained setter
//! used by administrators and accepts any transition. [`evaluate_confirmation`] is the
//! guarded path: it moves a sharaf to `confirmed` only once it is cleared and every payment
//! definition of its definition has been paid, and it never moves a sharaf anywhere else.
//! Recording a clearance or a payment re-runs the evaluator in the same transaction.

use crate::{
    core::catalog,
    entities::{
        Sharaf, SharafClearance, SharafMember, SharafPayment, SharafStatus, sharaf,
        sharaf_clearance, sharaf_member, sharaf_payment,
    },
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info, instrument};

/// Rows removed by [`delete_sharaf`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SharafDeletion {
    /// Members removed
    pub members: u64,
    /// Payments removed
    pub payments: u64,
    /// Clearances removed
    pub clearances: u64,
}

/// Creates a sharaf under `definition_id` with status `pending`.
///
/// When `rank` is `None` the sharaf is appended after the highest existing rank.
///
/// # Errors
/// * `NotFound` if the definition does not exist
/// * `InvalidArgument` if `hof_id` is blank, `rank` is below 1 or `capacity` is negative
/// * `Conflict` if the rank is already taken in the definition
/// * `InvalidState` if `rank` is `None` and no rank is left after the highest one
#[instrument(skip(db, name))]
pub async fn create_sharaf(
    db: &DatabaseConnection,
    definition_id: i64,
    hof_id: String,
    rank: Option<i32>,
    capacity: i32,
    name: Option<String>,
) -> Result<sharaf::Model> {
    let hof_id = hof_id.trim().to_string();
    if hof_id.is_empty() {
        return Err(Error::invalid_argument("HOF id cannot be empty"));
    }
    if capacity < 0 {
        return Err(Error::invalid_argument(format!(
            "capacity cannot be negative ({capacity})"
        )));
    }

    let txn = db.begin().await?;
    catalog::require_definition(&txn, definition_id).await?;

    let rank = match rank {
        Some(rank) if rank < 1 => {
            return Err(Error::invalid_argument(format!("rank must be at least 1 ({rank})")));
        }
        Some(rank) => {
            let taken = Sharaf::find()
                .filter(sharaf::Column::SharafDefinitionId.eq(definition_id))
                .filter(sharaf::Column::Rank.eq(rank))
                .one(&txn)
                .await?;
            if let Some(existing) = taken {
                return Err(Error::Conflict {
                    message: format!(
                        "rank {rank} is already held by sharaf {} in definition {definition_id}",
                        existing.id
                    ),
                });
            }
            rank
        }
        None => {
            let last = max_rank(&txn, definition_id).await?.unwrap_or(0);
            last.checked_add(1).ok_or_else(|| Error::InvalidState {
                message: format!("definition {definition_id} has no free rank after {last}"),
            })?
        }
    };

    let now = chrono::Utc::now();
    let created = sharaf::ActiveModel {
        sharaf_definition_id: Set(definition_id),
        rank: Set(rank),
        capacity: Set(capacity),
        name: Set(name),
        hof_id: Set(hof_id),
        status: Set(SharafStatus::Pending),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    debug!(sharaf = created.id, rank, "Created sharaf");
    Ok(created)
}

/// Deletes a sharaf together with its members, payments and clearances.
///
/// # Errors
/// Returns `NotFound` if the sharaf does not exist.
#[instrument(skip(db))]
pub async fn delete_sharaf(db: &DatabaseConnection, sharaf_id: i64) -> Result<SharafDeletion> {
    let txn = db.begin().await?;
    let existing = require_sharaf(&txn, sharaf_id).await?;

    let members = SharafMember::delete_many()
        .filter(sharaf_member::Column::SharafId.eq(sharaf_id))
        .exec(&txn)
        .await?
        .rows_affected;
    let payments = SharafPayment::delete_many()
        .filter(sharaf_payment::Column::SharafId.eq(sharaf_id))
        .exec(&txn)
        .await?
        .rows_affected;
    let clearances = SharafClearance::delete_many()
        .filter(sharaf_clearance::Column::SharafId.eq(sharaf_id))
        .exec(&txn)
        .await?
        .rows_affected;
    existing.delete(&txn).await?;

    txn.commit().await?;
    info!(sharaf = sharaf_id, members, payments, clearances, "Deleted sharaf");
    Ok(SharafDeletion {
        members,
        payments,
        clearances,
    })
}

/// Finds a sharaf by id.
pub async fn get_sharaf<C>(db: &C, sharaf_id: i64) -> Result<Option<sharaf::Model>>
where
    C: ConnectionTrait,
{
    Sharaf::find_by_id(sharaf_id)
        .one(db)
        .await
        .map_err(Into::into)
}

pub(crate) async fn require_sharaf<C>(db: &C, sharaf_id: i64) -> Result<sharaf::Model>
where
    C: ConnectionTrait,
{
    get_sharaf(db, sharaf_id)
        .await?
        .ok_or_else(|| Error::not_found("sharaf", sharaf_id))
}

/// Lists the sharafs of a definition in rank order.
pub async fn list_sharafs<C>(db: &C, definition_id: i64) -> Result<Vec<sharaf::Model>>
where
    C: ConnectionTrait,
{
    Sharaf::find()
        .filter(sharaf::Column::SharafDefinitionId.eq(definition_id))
        .order_by_asc(sharaf::Column::Rank)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Highest rank currently used in a definition, `None` when it has no sharafs.
pub(crate) async fn max_rank<C>(db: &C, definition_id: i64) -> Result<Option<i32>>
where
    C: ConnectionTrait,
{
    let highest = Sharaf::find()
        .filter(sharaf::Column::SharafDefinitionId.eq(definition_id))
        .order_by_desc(sharaf::Column::Rank)
        .one(db)
        .await?;
    Ok(highest.map(|s| s.rank))
}

/// Sets a sharaf's status without any transition check.
///
/// # Errors
/// Returns `NotFound` if the sharaf does not exist.
#[instrument(skip(db))]
pub async fn set_status(
    db: &DatabaseConnection,
    sharaf_id: i64,
    status: SharafStatus,
) -> Result<sharaf::Model> {
    let existing = require_sharaf(db, sharaf_id).await?;
    let previous = existing.status;
    let mut active_model: sharaf::ActiveModel = existing.into();
    active_model.status = Set(status);
    active_model.updated_at = Set(chrono::Utc::now());
    let updated = active_model.update(db).await?;
    info!(sharaf = sharaf_id, %previous, %status, "Set sharaf status");
    Ok(updated)
}

/// Confirms a sharaf if it is cleared and fully paid, returning the resulting status.
///
/// Idempotent: an already confirmed sharaf is left untouched, and a sharaf that does not yet
/// qualify keeps whatever status it has.
///
/// # Errors
/// Returns `NotFound` if the sharaf does not exist.
#[instrument(skip(db))]
pub async fn evaluate_confirmation(db: &DatabaseConnection, sharaf_id: i64) -> Result<SharafStatus> {
    let txn = db.begin().await?;
    let status = evaluate_confirmation_in(&txn, sharaf_id).await?;
    txn.commit().await?;
    Ok(status)
}

pub(crate) async fn evaluate_confirmation_in<C>(db: &C, sharaf_id: i64) -> Result<SharafStatus>
where
    C: ConnectionTrait,
{
    let existing = require_sharaf(db, sharaf_id).await?;
    if existing.status == SharafStatus::Confirmed {
        return Ok(SharafStatus::Confirmed);
    }

    // Only the clearance of the sharaf's current household head counts
    let cleared = SharafClearance::find()
        .filter(sharaf_clearance::Column::SharafId.eq(sharaf_id))
        .filter(sharaf_clearance::Column::HofId.eq(existing.hof_id.as_str()))
        .one(db)
        .await?
        .is_some_and(|c| c.is_cleared);
    if !cleared {
        debug!(sharaf = sharaf_id, "Not confirmed: clearance missing");
        return Ok(existing.status);
    }

    let required = catalog::list_payment_definitions(db, existing.sharaf_definition_id).await?;
    let paid: HashSet<i64> = SharafPayment::find()
        .filter(sharaf_payment::Column::SharafId.eq(sharaf_id))
        .filter(sharaf_payment::Column::PaymentStatus.eq(true))
        .all(db)
        .await?
        .into_iter()
        .map(|p| p.payment_definition_id)
        .collect();
    if let Some(unpaid) = required.iter().find(|d| !paid.contains(&d.id)) {
        debug!(sharaf = sharaf_id, unpaid = %unpaid.name, "Not confirmed: payment outstanding");
        return Ok(existing.status);
    }

    let mut active_model: sharaf::ActiveModel = existing.into();
    active_model.status = Set(SharafStatus::Confirmed);
    active_model.updated_at = Set(chrono::Utc::now());
    active_model.update(db).await?;
    info!(sharaf = sharaf_id, "Sharaf confirmed");
    Ok(SharafStatus::Confirmed)
}

/// Records the clearance of a household head for a sharaf and re-evaluates confirmation.
///
/// # Errors
/// Returns `NotFound` if the sharaf does not exist.
#[instrument(skip(db))]
pub async fn set_clearance(
    db: &DatabaseConnection,
    sharaf_id: i64,
    hof_id: &str,
    is_cleared: bool,
    cleared_by: Option<String>,
) -> Result<SharafStatus> {
    let txn = db.begin().await?;
    require_sharaf(&txn, sharaf_id).await?;

    let existing = SharafClearance::find()
        .filter(sharaf_clearance::Column::SharafId.eq(sharaf_id))
        .filter(sharaf_clearance::Column::HofId.eq(hof_id))
        .one(&txn)
        .await?;
    let now = chrono::Utc::now();
    if let Some(clearance) = existing {
        let mut active_model: sharaf_clearance::ActiveModel = clearance.into();
        active_model.is_cleared = Set(is_cleared);
        active_model.cleared_by = Set(cleared_by);
        active_model.cleared_at = Set(Some(now));
        active_model.update(&txn).await?;
    } else {
        sharaf_clearance::ActiveModel {
            sharaf_id: Set(sharaf_id),
            hof_id: Set(hof_id.to_string()),
            is_cleared: Set(is_cleared),
            cleared_by: Set(cleared_by),
            cleared_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    let status = evaluate_confirmation_in(&txn, sharaf_id).await?;
    txn.commit().await?;
    Ok(status)
}

/// Records whether a payment definition has been paid for a sharaf and re-evaluates
/// confirmation.
///
/// # Errors
/// * `NotFound` if the sharaf or the payment definition does not exist
/// * `InvalidArgument` if the payment definition belongs to another sharaf definition
#[instrument(skip(db))]
pub async fn set_payment_status(
    db: &DatabaseConnection,
    sharaf_id: i64,
    payment_definition_id: i64,
    paid: bool,
) -> Result<SharafStatus> {
    let txn = db.begin().await?;
    let existing_sharaf = require_sharaf(&txn, sharaf_id).await?;
    let definition = catalog::require_payment_definition(&txn, payment_definition_id).await?;
    if definition.sharaf_definition_id != existing_sharaf.sharaf_definition_id {
        return Err(Error::invalid_argument(format!(
            "payment definition {payment_definition_id} does not belong to definition {}",
            existing_sharaf.sharaf_definition_id
        )));
    }

    let existing = SharafPayment::find()
        .filter(sharaf_payment::Column::SharafId.eq(sharaf_id))
        .filter(sharaf_payment::Column::PaymentDefinitionId.eq(payment_definition_id))
        .one(&txn)
        .await?;
    if let Some(payment) = existing {
        let mut active_model: sharaf_payment::ActiveModel = payment.into();
        active_model.payment_status = Set(paid);
        active_model.update(&txn).await?;
    } else {
        sharaf_payment::ActiveModel {
            sharaf_id: Set(sharaf_id),
            payment_definition_id: Set(payment_definition_id),
            payment_status: Set(paid),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    let status = evaluate_confirmation_in(&txn, sharaf_id).await?;
    txn.commit().await?;
    Ok(status)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_sharaf_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = create_sharaf(&db, 1, "   ".to_string(), None, 4, None).await;
        assert!(matches!(result, Err(Error::InvalidArgument { .. })));

        let result = create_sharaf(&db, 1, "30361286".to_string(), None, -1, None).await;
        assert!(matches!(result, Err(Error::InvalidArgument { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_sharaf_assigns_next_rank() -> Result<()> {
        let db = setup_test_db().await?;
        let event = create_test_miqaat(&db, "Ashara").await?;
        let definition = create_test_definition(&db, event.id, "Majlis").await?;

        let first = create_sharaf(&db, definition.id, "1".to_string(), None, 4, None).await?;
        let fifth = create_sharaf(&db, definition.id, "2".to_string(), Some(5), 4, None).await?;
        let next = create_sharaf(&db, definition.id, "3".to_string(), None, 4, None).await?;

        assert_eq!(first.rank, 1);
        assert_eq!(fifth.rank, 5);
        assert_eq!(next.rank, 6);
        assert_eq!(first.status, SharafStatus::Pending);

        let result = create_sharaf(&db, definition.id, "4".to_string(), Some(5), 4, None).await;
        assert!(matches!(result, Err(Error::Conflict { .. })));

        let ranks: Vec<i32> = list_sharafs(&db, definition.id)
            .await?
            .iter()
            .map(|s| s.rank)
            .collect();
        assert_eq!(ranks, vec![1, 5, 6]);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_sharaf_after_highest_rank_is_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let event = create_test_miqaat(&db, "Ashara").await?;
        let definition = create_test_definition(&db, event.id, "Majlis").await?;
        create_sharaf(&db, definition.id, "1".to_string(), Some(i32::MAX), 4, None).await?;

        let result = create_sharaf(&db, definition.id, "2".to_string(), None, 4, None).await;
        assert!(matches!(result, Err(Error::InvalidState { .. })));
        assert_eq!(list_sharafs(&db, definition.id).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_set_status_is_unconstrained() -> Result<()> {
        let (db, fixture) = setup_with_mapping().await?;
        let allocation = create_test_sharaf(&db, fixture.source.id, 1).await?;

        // pending -> confirmed directly, without clearance, is accepted as is
        let updated = set_status(&db, allocation.id, SharafStatus::Confirmed).await?;
        assert_eq!(updated.status, SharafStatus::Confirmed);

        let updated = set_status(&db, allocation.id, SharafStatus::Pending).await?;
        assert_eq!(updated.status, SharafStatus::Pending);

        let result = set_status(&db, 999, SharafStatus::Cancelled).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_confirmation_requires_clearance_and_all_payments() -> Result<()> {
        let (db, fixture) = setup_with_mapping().await?;
        let niyaz = create_test_payment_definition(&db, fixture.source.id, "Niyaz").await?;
        let salawat = create_test_payment_definition(&db, fixture.source.id, "Salawat").await?;
        let allocation = create_test_sharaf(&db, fixture.source.id, 1).await?;

        assert_eq!(
            evaluate_confirmation(&db, allocation.id).await?,
            SharafStatus::Pending
        );

        let status = set_payment_status(&db, allocation.id, niyaz.id, true).await?;
        assert_eq!(status, SharafStatus::Pending);

        let status = set_clearance(&db, allocation.id, "HOF-1", true, Some("clerk".into())).await?;
        assert_eq!(status, SharafStatus::Pending, "Salawat is still unpaid");

        let status = set_payment_status(&db, allocation.id, salawat.id, true).await?;
        assert_eq!(status, SharafStatus::Confirmed);

        // Idempotent
        assert_eq!(
            evaluate_confirmation(&db, allocation.id).await?,
            SharafStatus::Confirmed
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_confirmation_without_payment_definitions_needs_only_clearance() -> Result<()> {
        let (db, fixture) = setup_with_mapping().await?;
        let allocation = create_test_sharaf(&db, fixture.source.id, 1).await?;

        let status = set_clearance(&db, allocation.id, "HOF-1", false, None).await?;
        assert_eq!(status, SharafStatus::Pending);

        let status = set_clearance(&db, allocation.id, "HOF-1", true, None).await?;
        assert_eq!(status, SharafStatus::Confirmed);
        Ok(())
    }

    #[tokio::test]
    async fn test_confirmation_never_regresses() -> Result<()> {
        let (db, fixture) = setup_with_mapping().await?;
        let allocation = create_test_sharaf(&db, fixture.source.id, 1).await?;
        set_status(&db, allocation.id, SharafStatus::BsApproved).await?;

        // Not qualified: status stays bs_approved rather than dropping back
        assert_eq!(
            evaluate_confirmation(&db, allocation.id).await?,
            SharafStatus::BsApproved
        );

        set_clearance(&db, allocation.id, "HOF-1", true, None).await?;
        // Revoking clearance afterwards leaves the confirmed status in place
        let status = set_clearance(&db, allocation.id, "HOF-1", false, None).await?;
        assert_eq!(status, SharafStatus::Confirmed);
        Ok(())
    }

    #[tokio::test]
    async fn test_confirmation_follows_current_household_head() -> Result<()> {
        let (db, fixture) = setup_with_mapping().await?;
        let allocation = create_test_sharaf(&db, fixture.source.id, 1).await?;

        // A stale row for a previous household head neither blocks nor satisfies
        let status = set_clearance(&db, allocation.id, "PREVIOUS-HOF", true, None).await?;
        assert_eq!(status, SharafStatus::Pending);

        set_clearance(&db, allocation.id, "OTHER-HOF", false, None).await?;
        let status = set_clearance(&db, allocation.id, "HOF-1", true, None).await?;
        assert_eq!(status, SharafStatus::Confirmed);
        Ok(())
    }

    #[tokio::test]
    async fn test_set_payment_status_rejects_foreign_definition() -> Result<()> {
        let (db, fixture) = setup_with_mapping().await?;
        let foreign = create_test_payment_definition(&db, fixture.target.id, "Nazrana").await?;
        let allocation = create_test_sharaf(&db, fixture.source.id, 1).await?;

        let result = set_payment_status(&db, allocation.id, foreign.id, true).await;
        assert!(matches!(result, Err(Error::InvalidArgument { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_sharaf_cascades() -> Result<()> {
        let (db, fixture) = setup_with_mapping().await?;
        let hof = create_test_position(&db, fixture.source.id, "HOF").await?;
        let niyaz = create_test_payment_definition(&db, fixture.source.id, "Niyaz").await?;
        let allocation = create_test_sharaf(&db, fixture.source.id, 1).await?;
        create_test_member(&db, allocation.id, hof.id, "1001").await?;
        create_test_member(&db, allocation.id, hof.id, "1002").await?;
        set_payment_status(&db, allocation.id, niyaz.id, false).await?;
        set_clearance(&db, allocation.id, "HOF-1", false, None).await?;

        let deletion = delete_sharaf(&db, allocation.id).await?;
        assert_eq!(
            deletion,
            SharafDeletion {
                members: 2,
                payments: 1,
                clearances: 1,
            }
        );
        assert!(get_sharaf(&db, allocation.id).await?.is_none());

        let result = delete_sharaf(&db, allocation.id).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        Ok(())
    }
}
