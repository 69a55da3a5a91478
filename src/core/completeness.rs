//! Completeness validation of a mapping against the sharafs it would move.
//!
//! Only positions and payment definitions that are actually referenced by members and
//! payments of the effective source definition have to be mapped; unused rows never block
//! a shift. Validation is read-only and generic over the connection so the shift executor
//! can re-run it inside its own transaction.

use crate::{
    core::{catalog, mapping::require_mapping, sub_mapping},
    entities::{
        Sharaf, SharafMember, SharafPayment, payment_mapping, position_mapping, sharaf,
        sharaf_member, sharaf_payment,
    },
    errors::Result,
};
use sea_orm::{QuerySelect, prelude::*};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

const UNKNOWN_NAME: &str = "Unknown";

/// A referenced position or payment definition without a sub-mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingItem {
    /// Id of the unmapped row
    pub id: i64,
    /// Name of the row, `"Unknown"` if it no longer resolves
    pub name: String,
}

/// Outcome of [`validate_mapping`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappingValidation {
    /// True iff both missing lists are empty
    pub is_complete: bool,
    /// In-use positions without a sub-mapping, ordered by id
    pub missing_positions: Vec<MissingItem>,
    /// In-use payment definitions without a sub-mapping, ordered by id
    pub missing_payment_definitions: Vec<MissingItem>,
}

impl MappingValidation {
    fn new(
        missing_positions: Vec<MissingItem>,
        missing_payment_definitions: Vec<MissingItem>,
    ) -> Self {
        Self {
            is_complete: missing_positions.is_empty() && missing_payment_definitions.is_empty(),
            missing_positions,
            missing_payment_definitions,
        }
    }
}

/// Direction-aware view of a mapping's sub-mappings: keys are ids in the effective source
/// definition, values the ids they map to in the effective target definition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingLookup {
    positions: HashMap<i64, i64>,
    payment_definitions: HashMap<i64, i64>,
}

impl MappingLookup {
    /// Builds the lookup from stored sub-mappings, inverting them when `reverse` is set.
    #[must_use]
    pub fn from_sub_mappings(
        positions: &[position_mapping::Model],
        payment_definitions: &[payment_mapping::Model],
        reverse: bool,
    ) -> Self {
        let orient = |from: i64, to: i64| if reverse { (to, from) } else { (from, to) };
        Self {
            positions: positions
                .iter()
                .map(|m| orient(m.source_position_id, m.target_position_id))
                .collect(),
            payment_definitions: payment_definitions
                .iter()
                .map(|m| orient(m.source_payment_definition_id, m.target_payment_definition_id))
                .collect(),
        }
    }

    /// Loads the sub-mappings of `mapping_id` and builds the lookup.
    pub async fn load<C>(db: &C, mapping_id: i64, reverse: bool) -> Result<Self>
    where
        C: ConnectionTrait,
    {
        let positions = sub_mapping::list_position_mappings(db, mapping_id).await?;
        let payments = sub_mapping::list_payment_mappings(db, mapping_id).await?;
        Ok(Self::from_sub_mappings(&positions, &payments, reverse))
    }

    /// Target position for a source position.
    #[must_use]
    pub fn position(&self, source_position_id: i64) -> Option<i64> {
        self.positions.get(&source_position_id).copied()
    }

    /// Target payment definition for a source payment definition.
    #[must_use]
    pub fn payment_definition(&self, source_payment_definition_id: i64) -> Option<i64> {
        self.payment_definitions
            .get(&source_payment_definition_id)
            .copied()
    }
}

/// Checks whether every position and payment definition in use by the sharafs to be moved
/// has a sub-mapping.
///
/// # Arguments
/// * `mapping_id` - Mapping to validate
/// * `sharaf_ids` - Restrict the check to these sharafs; `None` or an empty slice checks every
///   sharaf of the effective source definition
/// * `reverse` - Read from the mapping's target definition instead of its source
///
/// # Errors
/// Returns `NotFound` if the mapping does not exist.
pub async fn validate_mapping<C>(
    db: &C,
    mapping_id: i64,
    sharaf_ids: Option<&[i64]>,
    reverse: bool,
) -> Result<MappingValidation>
where
    C: ConnectionTrait,
{
    let mapping = require_mapping(db, mapping_id).await?;
    let (source_definition_id, _) = mapping.effective_definitions(reverse);
    let lookup = MappingLookup::load(db, mapping.id, reverse).await?;
    validate_with_lookup(db, source_definition_id, sharaf_ids, &lookup).await
}

/// Validation against an already built lookup.
pub(crate) async fn validate_with_lookup<C>(
    db: &C,
    source_definition_id: i64,
    sharaf_ids: Option<&[i64]>,
    lookup: &MappingLookup,
) -> Result<MappingValidation>
where
    C: ConnectionTrait,
{
    let in_scope = sharafs_in_scope(db, source_definition_id, sharaf_ids).await?;
    if in_scope.is_empty() {
        return Ok(MappingValidation::new(Vec::new(), Vec::new()));
    }

    let positions_in_use: BTreeSet<i64> = SharafMember::find()
        .select_only()
        .column(sharaf_member::Column::SharafPositionId)
        .distinct()
        .filter(sharaf_member::Column::SharafId.is_in(in_scope.clone()))
        .into_tuple::<i64>()
        .all(db)
        .await?
        .into_iter()
        .collect();

    let payments_in_use: BTreeSet<i64> = SharafPayment::find()
        .select_only()
        .column(sharaf_payment::Column::PaymentDefinitionId)
        .distinct()
        .filter(sharaf_payment::Column::SharafId.is_in(in_scope))
        .into_tuple::<i64>()
        .all(db)
        .await?
        .into_iter()
        .collect();

    let unmapped_positions: Vec<i64> = positions_in_use
        .into_iter()
        .filter(|id| lookup.position(*id).is_none())
        .collect();
    let unmapped_payments: Vec<i64> = payments_in_use
        .into_iter()
        .filter(|id| lookup.payment_definition(*id).is_none())
        .collect();

    let position_names = catalog::position_names(db, unmapped_positions.clone()).await?;
    let payment_names =
        catalog::payment_definition_names(db, unmapped_payments.clone()).await?;

    Ok(MappingValidation::new(
        named(unmapped_positions, &position_names),
        named(unmapped_payments, &payment_names),
    ))
}

/// Ids of the sharafs under `definition_id`, optionally restricted to `sharaf_ids`.
pub(crate) async fn sharafs_in_scope<C>(
    db: &C,
    definition_id: i64,
    sharaf_ids: Option<&[i64]>,
) -> Result<Vec<i64>>
where
    C: ConnectionTrait,
{
    let mut query = Sharaf::find()
        .select_only()
        .column(sharaf::Column::Id)
        .filter(sharaf::Column::SharafDefinitionId.eq(definition_id));
    if let Some(ids) = sharaf_ids.filter(|ids| !ids.is_empty()) {
        query = query.filter(sharaf::Column::Id.is_in(ids.to_vec()));
    }
    query
        .into_tuple::<i64>()
        .all(db)
        .await
        .map_err(Into::into)
}

fn named(ids: Vec<i64>, names: &HashMap<i64, String>) -> Vec<MissingItem> {
    ids.into_iter()
        .map(|id| MissingItem {
            id,
            name: names
                .get(&id)
                .cloned()
                .unwrap_or_else(|| UNKNOWN_NAME.to_string()),
        })
        .collect()
}
