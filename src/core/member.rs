//! Sharaf member business logic - Adds, removes and lists the people holding positions.
//!
//! A person may appear at most once per sharaf. Holding memberships in several sharafs is
//! permitted; [`add_member`] reports the other sharafs as warnings instead of rejecting.

use crate::{
    core::{catalog, sharaf::require_sharaf},
    entities::{SharafMember, sharaf_member, sharaf_position},
    errors::{Error, Result},
};
use sea_orm::{JoinType, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait, prelude::*};
use serde::Serialize;
use tracing::{info, instrument, warn};

/// Another sharaf in which the person being added already holds a membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoAllocationWarning {
    /// The other sharaf
    pub sharaf_id: i64,
    /// Position held there
    pub sharaf_position_id: i64,
}

/// Result of [`add_member`]: the stored row plus any co-allocation warnings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberAddition {
    /// The inserted membership
    pub member: sharaf_member::Model,
    /// Other sharafs the person already belongs to
    pub warnings: Vec<CoAllocationWarning>,
}

/// Adds a person to a position of a sharaf.
///
/// When `sequence` is `None` the member is placed after the last member of the same
/// position in the sharaf.
///
/// # Errors
/// * `NotFound` if the sharaf or the position does not exist
/// * `InvalidArgument` if `its_id` is blank or the position belongs to another definition
/// * `Conflict` if the person is already a member of this sharaf
/// * `InvalidState` if no sequence is left after the position's last member
#[instrument(skip(db))]
pub async fn add_member(
    db: &DatabaseConnection,
    sharaf_id: i64,
    position_id: i64,
    its_id: String,
    sequence: Option<i32>,
) -> Result<MemberAddition> {
    let its_id = its_id.trim().to_string();
    if its_id.is_empty() {
        return Err(Error::invalid_argument("ITS id cannot be empty"));
    }

    let txn = db.begin().await?;

    let allocation = require_sharaf(&txn, sharaf_id).await?;
    let position = catalog::require_position(&txn, position_id).await?;
    if position.sharaf_definition_id != allocation.sharaf_definition_id {
        return Err(Error::invalid_argument(format!(
            "position {} belongs to definition {}, sharaf {} to definition {}",
            position.id,
            position.sharaf_definition_id,
            allocation.id,
            allocation.sharaf_definition_id
        )));
    }

    let memberships = SharafMember::find()
        .filter(sharaf_member::Column::ItsId.eq(its_id.as_str()))
        .order_by_asc(sharaf_member::Column::SharafId)
        .all(&txn)
        .await?;
    if memberships.iter().any(|m| m.sharaf_id == sharaf_id) {
        return Err(duplicate_member(&its_id, sharaf_id));
    }
    let warnings: Vec<CoAllocationWarning> = memberships
        .into_iter()
        .map(|m| CoAllocationWarning {
            sharaf_id: m.sharaf_id,
            sharaf_position_id: m.sharaf_position_id,
        })
        .collect();
    if !warnings.is_empty() {
        warn!(
            its_id = %its_id,
            sharaf = sharaf_id,
            others = ?warnings.iter().map(|w| w.sharaf_id).collect::<Vec<_>>(),
            "Member already allocated in other sharafs"
        );
    }

    let sequence = match sequence {
        Some(sequence) => sequence,
        None => next_sequence(&txn, sharaf_id, position_id).await?,
    };

    let member = sharaf_member::ActiveModel {
        sharaf_id: Set(sharaf_id),
        sharaf_position_id: Set(position_id),
        its_id: Set(its_id.clone()),
        sequence: Set(sequence),
        name: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => duplicate_member(&its_id, sharaf_id),
        _ => Error::from(e),
    })?;

    txn.commit().await?;

    info!(sharaf = sharaf_id, position = %position.name, sequence, "Added member");
    Ok(MemberAddition { member, warnings })
}

/// Removes a person from a sharaf, returning the number of rows deleted.
///
/// Removing a membership that does not exist is a no-op returning 0.
#[instrument(skip(db))]
pub async fn remove_member(db: &DatabaseConnection, sharaf_id: i64, its_id: &str) -> Result<u64> {
    let removed = SharafMember::delete_many()
        .filter(sharaf_member::Column::SharafId.eq(sharaf_id))
        .filter(sharaf_member::Column::ItsId.eq(its_id))
        .exec(db)
        .await?
        .rows_affected;
    if removed > 0 {
        info!(sharaf = sharaf_id, removed, "Removed member");
    }
    Ok(removed)
}

/// Lists the members of a sharaf ordered by position display order, then sequence.
pub async fn list_members<C>(db: &C, sharaf_id: i64) -> Result<Vec<sharaf_member::Model>>
where
    C: ConnectionTrait,
{
    SharafMember::find()
        .join(JoinType::InnerJoin, sharaf_member::Relation::SharafPosition.def())
        .filter(sharaf_member::Column::SharafId.eq(sharaf_id))
        .order_by_asc(sharaf_position::Column::DisplayOrder)
        .order_by_asc(sharaf_member::Column::Sequence)
        .order_by_asc(sharaf_member::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

async fn next_sequence<C>(db: &C, sharaf_id: i64, position_id: i64) -> Result<i32>
where
    C: ConnectionTrait,
{
    let last = SharafMember::find()
        .filter(sharaf_member::Column::SharafId.eq(sharaf_id))
        .filter(sharaf_member::Column::SharafPositionId.eq(position_id))
        .order_by_desc(sharaf_member::Column::Sequence)
        .one(db)
        .await?;
    match last {
        None => Ok(1),
        Some(m) => m.sequence.checked_add(1).ok_or_else(|| Error::InvalidState {
            message: format!(
                "position {position_id} of sharaf {sharaf_id} has no free sequence after {}",
                m.sequence
            ),
        }),
    }
}

fn duplicate_member(its_id: &str, sharaf_id: i64) -> Error {
    Error::Conflict {
        message: format!("{its_id} is already a member of sharaf {sharaf_id}"),
    }
}
