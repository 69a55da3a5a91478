//! Shift business logic - Moves sharafs from one definition to another through a mapping.
//!
//! A shift runs entirely inside one database transaction:
//!
//! 1. the mapping must be active and the optional sharaf filter must lie in the effective
//!    source definition;
//! 2. the mapping must be complete for the sharafs being moved;
//! 3. the sharafs move to the target definition in ascending rank order, placed after every
//!    sharaf already there, and their members and payments are rewritten through the
//!    direction-aware lookup;
//! 4. the target definition is renumbered to a dense `1..N` rank sequence;
//! 5. one audit row records what happened.
//!
//! Any error drops the transaction uncommitted, so a failed shift leaves both definitions
//! exactly as they were. Clearances reference sharafs by id only and need no rewrite.

use crate::{
    core::{
        catalog,
        completeness::{MappingLookup, sharafs_in_scope, validate_with_lookup},
        mapping::require_mapping,
        sharaf::{list_sharafs, max_rank},
    },
    entities::{
        Sharaf, SharafClearance, SharafMember, SharafPayment, ShiftAudit, sharaf,
        sharaf_clearance, sharaf_member, sharaf_payment, shift_audit,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, info, instrument, warn};

/// Rank of one sharaf before and after a shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankChange {
    /// The sharaf whose rank changed
    pub sharaf_id: i64,
    /// Rank before the shift
    pub old_rank: i32,
    /// Rank after the shift and renumbering
    pub new_rank: i32,
}

/// A sub-mapping that was exercised by a shift, oriented in the shift's direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingPair {
    /// Id in the effective source definition
    pub source_id: i64,
    /// Id in the effective target definition
    pub target_id: i64,
    /// Name of the source row
    pub source_name: String,
    /// Name of the target row
    pub target_name: String,
}

impl std::fmt::Display for MappingPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}->{}", self.source_name, self.target_name)
    }
}

/// Outcome of [`shift_sharafs`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShiftResult {
    /// Number of sharafs moved
    pub sharafs_moved: usize,
    /// Number of members carried along
    pub members_moved: usize,
    /// Number of clearances carried along
    pub clearances_moved: usize,
    /// Number of payments carried along
    pub payments_moved: usize,
    /// Ids of the moved sharafs in original rank order
    pub sharaf_ids: Vec<i64>,
    /// Rank changes of moved sharafs followed by renumbered pre-existing ones
    pub rank_changes: Vec<RankChange>,
    /// Position sub-mappings that were exercised
    pub position_mappings_used: Vec<MappingPair>,
    /// Payment sub-mappings that were exercised
    pub payment_mappings_used: Vec<MappingPair>,
    /// Audit row written for the shift, `None` when nothing moved
    pub audit_id: Option<i64>,
}

/// Shift audit row with its JSON columns decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditEntry {
    /// Audit row id
    pub id: i64,
    /// Mapping the shift ran through
    pub definition_mapping_id: i64,
    /// Actor who ran the shift
    pub shifted_by: Option<String>,
    /// Number of sharafs moved
    pub sharafs_moved: i32,
    /// Number of members carried along
    pub members_moved: i32,
    /// Number of clearances carried along
    pub clearances_moved: i32,
    /// Number of payments carried along
    pub payments_moved: i32,
    /// Whether the mapping was traversed target to source
    pub reverse_direction: bool,
    /// Ids of the moved sharafs
    pub sharaf_ids: Vec<i64>,
    /// Position sub-mappings that were exercised
    pub position_mappings_used: Vec<MappingPair>,
    /// Payment sub-mappings that were exercised
    pub payment_mappings_used: Vec<MappingPair>,
    /// Rank changes applied
    pub rank_changes: Vec<RankChange>,
    /// When the shift was committed
    pub created_at: DateTime<Utc>,
}

impl TryFrom<shift_audit::Model> for AuditEntry {
    type Error = Error;

    fn try_from(model: shift_audit::Model) -> Result<Self> {
        Ok(Self {
            id: model.id,
            definition_mapping_id: model.definition_mapping_id,
            shifted_by: model.shifted_by,
            sharafs_moved: model.sharafs_moved,
            members_moved: model.members_moved,
            clearances_moved: model.clearances_moved,
            payments_moved: model.payments_moved,
            reverse_direction: model.reverse_direction,
            sharaf_ids: serde_json::from_value(model.sharaf_ids)?,
            position_mappings_used: serde_json::from_value(model.position_mappings_used)?,
            payment_mappings_used: serde_json::from_value(model.payment_mappings_used)?,
            rank_changes: serde_json::from_value(model.rank_changes)?,
            created_at: model.created_at,
        })
    }
}

/// Moves sharafs, with their members and payments, across a mapping.
///
/// # Arguments
/// * `mapping_id` - Mapping to shift through
/// * `shifted_by` - Actor recorded on the audit row
/// * `sharaf_ids` - Restrict the shift to these sharafs; `None` or an empty slice moves every
///   sharaf of the effective source definition
/// * `reverse` - Move from the mapping's target definition to its source
///
/// # Errors
/// * `NotFound` if the mapping does not exist
/// * `InvalidState` if the mapping is inactive
/// * `InvalidArgument` if a filtered id is not a sharaf of the effective source definition
/// * `IncompleteMapping` if an in-use position or payment definition has no sub-mapping
/// * `InvalidState` if the moved ranks would not fit after the target's highest rank
/// * `Database` on storage failure; nothing is committed
#[instrument(skip(db))]
#[allow(clippy::too_many_lines)]
pub async fn shift_sharafs(
    db: &DatabaseConnection,
    mapping_id: i64,
    shifted_by: Option<String>,
    sharaf_ids: Option<&[i64]>,
    reverse: bool,
) -> Result<ShiftResult> {
    let txn = db.begin().await?;

    let mapping = require_mapping(&txn, mapping_id).await?;
    if !mapping.is_active {
        return Err(Error::InvalidState {
            message: format!("mapping {mapping_id} is inactive"),
        });
    }
    let (source_definition_id, target_definition_id) = mapping.effective_definitions(reverse);
    let filter = sharaf_ids.filter(|ids| !ids.is_empty());

    if let Some(ids) = filter {
        let in_source: HashSet<i64> = sharafs_in_scope(&txn, source_definition_id, Some(ids))
            .await?
            .into_iter()
            .collect();
        let offending: BTreeSet<i64> = ids
            .iter()
            .copied()
            .filter(|id| !in_source.contains(id))
            .collect();
        if !offending.is_empty() {
            return Err(Error::invalid_argument(format!(
                "sharafs {offending:?} do not belong to source definition {source_definition_id}"
            )));
        }
    }

    let lookup = MappingLookup::load(&txn, mapping.id, reverse).await?;
    let validation = validate_with_lookup(&txn, source_definition_id, filter, &lookup).await?;
    if !validation.is_complete {
        warn!(
            mapping = mapping_id,
            reverse,
            missing_positions = ?validation.missing_positions,
            missing_payment_definitions = ?validation.missing_payment_definitions,
            "Rejected shift through incomplete mapping"
        );
        return Err(Error::IncompleteMapping {
            missing_positions: validation.missing_positions,
            missing_payment_definitions: validation.missing_payment_definitions,
        });
    }

    let mut query = Sharaf::find().filter(sharaf::Column::SharafDefinitionId.eq(source_definition_id));
    if let Some(ids) = filter {
        query = query.filter(sharaf::Column::Id.is_in(ids.to_vec()));
    }
    let moving = query.order_by_asc(sharaf::Column::Rank).all(&txn).await?;

    let Some(lowest_rank) = moving.first().map(|s| s.rank) else {
        txn.commit().await?;
        info!(mapping = mapping_id, reverse, "Nothing to shift");
        return Ok(ShiftResult::default());
    };

    let moved_ids: Vec<i64> = moving.iter().map(|s| s.id).collect();
    let members = SharafMember::find()
        .filter(sharaf_member::Column::SharafId.is_in(moved_ids.clone()))
        .order_by_asc(sharaf_member::Column::Id)
        .all(&txn)
        .await?;
    let payments = SharafPayment::find()
        .filter(sharaf_payment::Column::SharafId.is_in(moved_ids.clone()))
        .order_by_asc(sharaf_payment::Column::Id)
        .all(&txn)
        .await?;

    // Place the moved block after the target's current tail, keeping relative order
    let target_max = max_rank(&txn, target_definition_id).await?.unwrap_or(0);
    let offset = target_max
        .checked_add(1)
        .and_then(|next| next.checked_sub(lowest_rank))
        .ok_or_else(|| rank_overflow(target_definition_id))?;
    debug!(offset, target = target_definition_id, "Computed rank offset");

    let now = Utc::now();
    let mut rank_changes = Vec::with_capacity(moving.len());
    for allocation in moving {
        let sharaf_id = allocation.id;
        let old_rank = allocation.rank;
        let new_rank = old_rank
            .checked_add(offset)
            .ok_or_else(|| rank_overflow(target_definition_id))?;
        let mut active_model: sharaf::ActiveModel = allocation.into();
        active_model.sharaf_definition_id = Set(target_definition_id);
        active_model.rank = Set(new_rank);
        active_model.updated_at = Set(now);
        active_model.update(&txn).await?;
        rank_changes.push(RankChange {
            sharaf_id,
            old_rank,
            new_rank,
        });
    }

    let members_moved = members.len();
    let mut positions_used: BTreeSet<(i64, i64)> = BTreeSet::new();
    for member in members {
        let Some(target_position) = lookup.position(member.sharaf_position_id) else {
            continue;
        };
        positions_used.insert((member.sharaf_position_id, target_position));
        let mut active_model: sharaf_member::ActiveModel = member.into();
        active_model.sharaf_position_id = Set(target_position);
        active_model.update(&txn).await?;
    }

    let payments_moved = payments.len();
    let mut payments_used: BTreeSet<(i64, i64)> = BTreeSet::new();
    for payment in payments {
        let Some(target_payment) = lookup.payment_definition(payment.payment_definition_id)
        else {
            continue;
        };
        payments_used.insert((payment.payment_definition_id, target_payment));
        let mut active_model: sharaf_payment::ActiveModel = payment.into();
        active_model.payment_definition_id = Set(target_payment);
        active_model.update(&txn).await?;
    }

    let clearances_moved = usize::try_from(
        SharafClearance::find()
            .filter(sharaf_clearance::Column::SharafId.is_in(moved_ids.clone()))
            .count(&txn)
            .await?,
    )?;

    renumber_definition(&txn, target_definition_id, &mut rank_changes, now).await?;

    let position_mappings_used = name_pairs(
        &positions_used,
        &catalog::position_names(&txn, pair_ids(&positions_used)).await?,
    );
    let payment_mappings_used = name_pairs(
        &payments_used,
        &catalog::payment_definition_names(&txn, pair_ids(&payments_used)).await?,
    );

    let audit = shift_audit::ActiveModel {
        definition_mapping_id: Set(mapping.id),
        shifted_by: Set(shifted_by),
        sharafs_moved: Set(i32::try_from(moved_ids.len())?),
        members_moved: Set(i32::try_from(members_moved)?),
        clearances_moved: Set(i32::try_from(clearances_moved)?),
        payments_moved: Set(i32::try_from(payments_moved)?),
        reverse_direction: Set(reverse),
        sharaf_ids: Set(serde_json::to_value(&moved_ids)?),
        position_mappings_used: Set(serde_json::to_value(&position_mappings_used)?),
        payment_mappings_used: Set(serde_json::to_value(&payment_mappings_used)?),
        rank_changes: Set(serde_json::to_value(&rank_changes)?),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    info!(
        mapping = mapping_id,
        reverse,
        sharafs = moved_ids.len(),
        members = members_moved,
        payments = payments_moved,
        clearances = clearances_moved,
        audit = audit.id,
        "Shift completed"
    );

    Ok(ShiftResult {
        sharafs_moved: moved_ids.len(),
        members_moved,
        clearances_moved,
        payments_moved,
        sharaf_ids: moved_ids,
        rank_changes,
        position_mappings_used,
        payment_mappings_used,
        audit_id: Some(audit.id),
    })
}

/// Re-densifies the ranks of a definition to `1..N`, writing only rows that change.
///
/// Rows that change are first parked on temporary ranks below every rank in the definition,
/// then given their dense rank, so any set of distinct ranks renumbers without a collision.
/// Changes to sharafs already present in `rank_changes` update their `new_rank`; other
/// renumbered sharafs are appended.
async fn renumber_definition<C>(
    db: &C,
    definition_id: i64,
    rank_changes: &mut Vec<RankChange>,
    now: DateTime<Utc>,
) -> Result<()>
where
    C: ConnectionTrait,
{
    let allocations = list_sharafs(db, definition_id).await?;
    let floor = allocations.first().map_or(1, |s| s.rank.min(1));

    let mut changed = Vec::new();
    for (index, allocation) in allocations.into_iter().enumerate() {
        let dense_rank = i32::try_from(index + 1)?;
        if allocation.rank != dense_rank {
            changed.push((allocation, dense_rank));
        }
    }
    if changed.is_empty() {
        return Ok(());
    }
    debug!(definition = definition_id, rows = changed.len(), "Renumbering ranks");

    for (parked, (allocation, _)) in changed.iter().enumerate() {
        let temporary = i32::try_from(parked + 1)
            .ok()
            .and_then(|step| floor.checked_sub(step))
            .ok_or_else(|| rank_overflow(definition_id))?;
        let mut active_model: sharaf::ActiveModel = allocation.clone().into();
        active_model.rank = Set(temporary);
        active_model.update(db).await?;
    }

    let index_of: HashMap<i64, usize> = rank_changes
        .iter()
        .enumerate()
        .map(|(i, change)| (change.sharaf_id, i))
        .collect();

    for (allocation, dense_rank) in changed {
        let sharaf_id = allocation.id;
        let current_rank = allocation.rank;
        let mut active_model: sharaf::ActiveModel = allocation.into();
        active_model.rank = Set(dense_rank);
        active_model.updated_at = Set(now);
        active_model.update(db).await?;

        match index_of.get(&sharaf_id) {
            Some(&i) => rank_changes[i].new_rank = dense_rank,
            None => rank_changes.push(RankChange {
                sharaf_id,
                old_rank: current_rank,
                new_rank: dense_rank,
            }),
        }
    }
    Ok(())
}

fn rank_overflow(definition_id: i64) -> Error {
    Error::InvalidState {
        message: format!("ranks of definition {definition_id} are out of range"),
    }
}

fn pair_ids(pairs: &BTreeSet<(i64, i64)>) -> Vec<i64> {
    pairs.iter().flat_map(|&(from, to)| [from, to]).collect()
}

fn name_pairs(pairs: &BTreeSet<(i64, i64)>, names: &HashMap<i64, String>) -> Vec<MappingPair> {
    let name_of = |id: i64| {
        names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| "Unknown".to_string())
    };
    pairs
        .iter()
        .map(|&(source_id, target_id)| MappingPair {
            source_id,
            target_id,
            source_name: name_of(source_id),
            target_name: name_of(target_id),
        })
        .collect()
}

/// Lists shift audits newest first, optionally for one mapping and capped at `limit` rows.
pub async fn list_shift_audits(
    db: &DatabaseConnection,
    mapping_id: Option<i64>,
    limit: Option<u64>,
) -> Result<Vec<AuditEntry>> {
    let mut query = ShiftAudit::find();
    if let Some(mapping_id) = mapping_id {
        query = query.filter(shift_audit::Column::DefinitionMappingId.eq(mapping_id));
    }
    if let Some(limit) = limit {
        query = query.limit(limit);
    }
    query
        .order_by_desc(shift_audit::Column::CreatedAt)
        .order_by_desc(shift_audit::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(AuditEntry::try_from)
        .collect()
}

/// Finds a shift audit by id.
pub async fn get_shift_audit(db: &DatabaseConnection, audit_id: i64) -> Result<Option<AuditEntry>> {
    ShiftAudit::find_by_id(audit_id)
        .one(db)
        .await?
        .map(AuditEntry::try_from)
        .transpose()
}
