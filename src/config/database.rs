//! Database configuration module.
//!
//! This module handles the database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! and the composite unique indexes the engine relies on (ranks per definition, one
//! membership per person per sharaf, injective sub-mappings) are added with `sea_query`.
//! Every statement is `IF NOT EXISTS`, so calling `create_tables` on start-up is idempotent.

use crate::entities::{
    DefinitionMapping, Miqaat, PaymentDefinition, PaymentMapping, PositionMapping, Sharaf,
    SharafClearance, SharafDefinition, SharafMember, SharafPayment, SharafPosition, ShiftAudit,
    definition_mapping, payment_definition, payment_mapping, position_mapping, sharaf,
    sharaf_clearance, sharaf_member, sharaf_payment, sharaf_position,
};
use crate::errors::Result;
use sea_orm::sea_query::{Index, IndexCreateStatement};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use tracing::{debug, info};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/sharaf_shift.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable, then the configured
/// fallback, then the default local `SQLite` file.
#[must_use]
pub fn get_database_url(configured: Option<&str>) -> String {
    std::env::var("DATABASE_URL")
        .ok()
        .or_else(|| configured.map(ToString::to_string))
        .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database at `database_url`.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    debug!("Connecting to database at {}", database_url);
    Database::connect(database_url).await.map_err(Into::into)
}

/// Creates all tables and unique indexes if they do not already exist.
pub async fn create_tables<C>(db: &C) -> Result<()>
where
    C: ConnectionTrait,
{
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    // Parents before children so foreign keys resolve on backends that check them eagerly
    create_table(db, &schema, Miqaat).await?;
    create_table(db, &schema, SharafDefinition).await?;
    create_table(db, &schema, SharafPosition).await?;
    create_table(db, &schema, PaymentDefinition).await?;
    create_table(db, &schema, Sharaf).await?;
    create_table(db, &schema, SharafMember).await?;
    create_table(db, &schema, SharafPayment).await?;
    create_table(db, &schema, SharafClearance).await?;
    create_table(db, &schema, DefinitionMapping).await?;
    create_table(db, &schema, PositionMapping).await?;
    create_table(db, &schema, PaymentMapping).await?;
    create_table(db, &schema, ShiftAudit).await?;

    for index in unique_indexes() {
        db.execute(builder.build(&index)).await?;
    }

    info!("Database tables and unique indexes ensured");
    Ok(())
}

async fn create_table<C, E>(db: &C, schema: &Schema, entity: E) -> Result<()>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(db.get_database_backend().build(&statement))
        .await?;
    Ok(())
}

fn unique_indexes() -> Vec<IndexCreateStatement> {
    vec![
        Index::create()
            .name("idx_unique_position_name_per_definition")
            .table(SharafPosition)
            .col(sharaf_position::Column::SharafDefinitionId)
            .col(sharaf_position::Column::Name)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_unique_payment_name_per_definition")
            .table(PaymentDefinition)
            .col(payment_definition::Column::SharafDefinitionId)
            .col(payment_definition::Column::Name)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_unique_sharaf_rank_per_definition")
            .table(Sharaf)
            .col(sharaf::Column::SharafDefinitionId)
            .col(sharaf::Column::Rank)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_unique_member_per_sharaf")
            .table(SharafMember)
            .col(sharaf_member::Column::SharafId)
            .col(sharaf_member::Column::ItsId)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_unique_payment_per_sharaf")
            .table(SharafPayment)
            .col(sharaf_payment::Column::SharafId)
            .col(sharaf_payment::Column::PaymentDefinitionId)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_unique_clearance_per_sharaf_hof")
            .table(SharafClearance)
            .col(sharaf_clearance::Column::SharafId)
            .col(sharaf_clearance::Column::HofId)
            .unique()
            .if_not_exists()
            .to_owned(),
        // The reverse direction is rejected by an explicit two-way lookup in core::mapping
        Index::create()
            .name("idx_unique_definition_mapping_pair")
            .table(DefinitionMapping)
            .col(definition_mapping::Column::SourceDefinitionId)
            .col(definition_mapping::Column::TargetDefinitionId)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_unique_position_mapping_source")
            .table(PositionMapping)
            .col(position_mapping::Column::DefinitionMappingId)
            .col(position_mapping::Column::SourcePositionId)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_unique_position_mapping_target")
            .table(PositionMapping)
            .col(position_mapping::Column::DefinitionMappingId)
            .col(position_mapping::Column::TargetPositionId)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_unique_payment_mapping_source")
            .table(PaymentMapping)
            .col(payment_mapping::Column::DefinitionMappingId)
            .col(payment_mapping::Column::SourcePaymentDefinitionId)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_unique_payment_mapping_target")
            .table(PaymentMapping)
            .col(payment_mapping::Column::DefinitionMappingId)
            .col(payment_mapping::Column::TargetPaymentDefinitionId)
            .unique()
            .if_not_exists()
            .to_owned(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{definition_mapping::Model as DefinitionMappingModel, miqaat};
    use sea_orm::{ActiveModelTrait, QuerySelect, Set};

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<DefinitionMappingModel> = DefinitionMapping::find().limit(1).all(&db).await?;
        let _ = Sharaf::find().limit(1).all(&db).await?;
        let _ = ShiftAudit::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_unique_index_rejects_duplicate_position_name() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        let event = miqaat::ActiveModel {
            name: Set("Ashara".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await?;
        let definition = crate::entities::sharaf_definition::ActiveModel {
            miqaat_id: Set(event.id),
            name: Set("Majlis".to_string()),
            description: Set(None),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let position = |name: &str| sharaf_position::ActiveModel {
            sharaf_definition_id: Set(definition.id),
            name: Set(name.to_string()),
            display_order: Set(1),
            capacity: Set(None),
            ..Default::default()
        };
        position("HOF").insert(&db).await?;
        assert!(position("HOF").insert(&db).await.is_err());

        Ok(())
    }

    #[test]
    fn test_get_database_url_uses_configured_value() {
        // DATABASE_URL may be set in the environment; only assert the fallback chain shape
        let url = get_database_url(Some("sqlite::memory:"));
        assert!(url == "sqlite::memory:" || std::env::var("DATABASE_URL").is_ok());
    }
}
