//! Read-only lookups of definitions, positions and payment definitions.
//!
//! These rows are owned by collaborator CRUD code. The engine only needs to resolve them
//! and to check which definition they belong to, so every function here is a plain query
//! generic over the connection type and usable inside an open transaction.

use crate::{
    entities::{
        Miqaat, PaymentDefinition, SharafDefinition, SharafPosition, miqaat, payment_definition,
        sharaf_definition, sharaf_position,
    },
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, prelude::*};
use std::collections::HashMap;

/// Finds a miqaat by id.
pub async fn get_miqaat<C>(db: &C, miqaat_id: i64) -> Result<Option<miqaat::Model>>
where
    C: ConnectionTrait,
{
    Miqaat::find_by_id(miqaat_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a sharaf definition by id.
pub async fn get_definition<C>(
    db: &C,
    definition_id: i64,
) -> Result<Option<sharaf_definition::Model>>
where
    C: ConnectionTrait,
{
    SharafDefinition::find_by_id(definition_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Like [`get_definition`] but fails with `NotFound` when the definition is missing.
pub async fn require_definition<C>(db: &C, definition_id: i64) -> Result<sharaf_definition::Model>
where
    C: ConnectionTrait,
{
    get_definition(db, definition_id)
        .await?
        .ok_or_else(|| Error::not_found("sharaf definition", definition_id))
}

/// Finds a position by id.
pub async fn get_position<C>(db: &C, position_id: i64) -> Result<Option<sharaf_position::Model>>
where
    C: ConnectionTrait,
{
    SharafPosition::find_by_id(position_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Like [`get_position`] but fails with `NotFound` when the position is missing.
pub async fn require_position<C>(db: &C, position_id: i64) -> Result<sharaf_position::Model>
where
    C: ConnectionTrait,
{
    get_position(db, position_id)
        .await?
        .ok_or_else(|| Error::not_found("sharaf position", position_id))
}

/// Finds a payment definition by id.
pub async fn get_payment_definition<C>(
    db: &C,
    payment_definition_id: i64,
) -> Result<Option<payment_definition::Model>>
where
    C: ConnectionTrait,
{
    PaymentDefinition::find_by_id(payment_definition_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Like [`get_payment_definition`] but fails with `NotFound` when the row is missing.
pub async fn require_payment_definition<C>(
    db: &C,
    payment_definition_id: i64,
) -> Result<payment_definition::Model>
where
    C: ConnectionTrait,
{
    get_payment_definition(db, payment_definition_id)
        .await?
        .ok_or_else(|| Error::not_found("payment definition", payment_definition_id))
}

/// Lists the positions of a definition in display order.
pub async fn list_positions<C>(db: &C, definition_id: i64) -> Result<Vec<sharaf_position::Model>>
where
    C: ConnectionTrait,
{
    SharafPosition::find()
        .filter(sharaf_position::Column::SharafDefinitionId.eq(definition_id))
        .order_by_asc(sharaf_position::Column::DisplayOrder)
        .order_by_asc(sharaf_position::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Lists the payment definitions of a definition ordered by id.
pub async fn list_payment_definitions<C>(
    db: &C,
    definition_id: i64,
) -> Result<Vec<payment_definition::Model>>
where
    C: ConnectionTrait,
{
    PaymentDefinition::find()
        .filter(payment_definition::Column::SharafDefinitionId.eq(definition_id))
        .order_by_asc(payment_definition::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Resolves position names for a set of ids. Ids that no longer resolve are absent.
pub async fn position_names<C>(db: &C, ids: Vec<i64>) -> Result<HashMap<i64, String>>
where
    C: ConnectionTrait,
{
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = SharafPosition::find()
        .filter(sharaf_position::Column::Id.is_in(ids))
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|p| (p.id, p.name)).collect())
}

/// Resolves payment definition names for a set of ids. Ids that no longer resolve are absent.
pub async fn payment_definition_names<C>(db: &C, ids: Vec<i64>) -> Result<HashMap<i64, String>>
where
    C: ConnectionTrait,
{
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = PaymentDefinition::find()
        .filter(payment_definition::Column::Id.is_in(ids))
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|p| (p.id, p.name)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_require_definition_not_found() -> Result<()> {
        let db = setup_test_db().await?;
        let result = require_definition(&db, 999).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_list_positions_in_display_order() -> Result<()> {
        let db = setup_test_db().await?;
        let event = create_test_miqaat(&db, "Ashara").await?;
        let definition = create_test_definition(&db, event.id, "Majlis").await?;
        let second = create_custom_position(&db, definition.id, "FM", 2).await?;
        let first = create_custom_position(&db, definition.id, "HOF", 1).await?;

        let positions = list_positions(&db, definition.id).await?;
        assert_eq!(positions, vec![first, second]);
        Ok(())
    }

    #[tokio::test]
    async fn test_position_names_skips_unknown_ids() -> Result<()> {
        let db = setup_test_db().await?;
        let event = create_test_miqaat(&db, "Ashara").await?;
        let definition = create_test_definition(&db, event.id, "Majlis").await?;
        let hof = create_test_position(&db, definition.id, "HOF").await?;

        let names = position_names(&db, vec![hof.id, 999]).await?;
        assert_eq!(names.len(), 1);
        assert_eq!(names.get(&hof.id).map(String::as_str), Some("HOF"));
        Ok(())
    }
}
