//! Database configuration module for the storefront.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs. Two uniqueness rules that `SeaORM` cannot
//! derive from the entities are added on top:
//!
//! - at most one incomplete order per user (partial unique index on `orders`)
//! - at most one line per product within an order (unique index on `order_items`)
//!
//! The cart engine relies on both to resolve concurrent get-or-create races by re-reading.

use crate::entities::{Category, Order, OrderItem, OrderItemColumn, Product};
use crate::errors::Result;
use sea_orm::sea_query::{Index, TableCreateStatement};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use tracing::{debug, info};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/estore.sqlite?mode=rwc";

/// Name of the partial unique index guarding the single-active-order rule.
pub const ACTIVE_ORDER_INDEX: &str = "idx_orders_one_active_per_user";

/// Name of the unique index guarding one line per product per order.
pub const ORDER_LINE_INDEX: &str = "idx_order_items_order_product";

/// Gets the database URL from environment variable or returns default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
///
/// Falls back to a local `SQLite` file if no environment variable is set.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    debug!("Connecting to database at {database_url}");
    Database::connect(&database_url).await.map_err(Into::into)
}

fn table_for<E: EntityTrait>(schema: &Schema, entity: E) -> TableCreateStatement {
    let mut table = schema.create_table_from_entity(entity);
    table.if_not_exists();
    table
}

/// Creates all storefront tables and indexes if they do not already exist.
///
/// Tables are created parent-first so foreign keys resolve: categories, products,
/// orders, then order items.
pub async fn create_tables<C: ConnectionTrait>(db: &C) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    db.execute(builder.build(&table_for(&schema, Category))).await?;
    db.execute(builder.build(&table_for(&schema, Product))).await?;
    db.execute(builder.build(&table_for(&schema, Order))).await?;
    db.execute(builder.build(&table_for(&schema, OrderItem))).await?;

    // Partial indexes are not expressible through the index builder
    db.execute_unprepared(&format!(
        "CREATE UNIQUE INDEX IF NOT EXISTS {ACTIVE_ORDER_INDEX} \
         ON orders (user_id) WHERE complete = FALSE"
    ))
    .await?;

    let line_index = Index::create()
        .name(ORDER_LINE_INDEX)
        .table(OrderItem)
        .col(OrderItemColumn::OrderId)
        .col(OrderItemColumn::ProductId)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&line_index)).await?;

    info!("Database tables and indexes ensured");
    Ok(())
}
