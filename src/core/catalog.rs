//! Catalog business logic - Categories and products.
//!
//! The catalog is read-mostly: the storefront lists and shows products, and the
//! checkout coordinator decrements stock. Creation and deletion exist for seeding
//! and maintenance. Deletes apply their referential rules explicitly inside the
//! same database transaction as the delete itself.

use crate::{
    entities::{Category, OrderItem, Product, category, order_item, product},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use tracing::{info, instrument};

/// Input for [`create_product`].
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
    pub category_id: Option<i64>,
    pub image: Option<String>,
}

/// Retrieves every product, ordered alphabetically by name.
pub async fn list_products<C: ConnectionTrait>(db: &C) -> Result<Vec<product::Model>> {
    Product::find()
        .order_by_asc(product::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a product by id.
///
/// # Errors
/// Returns `Error::ProductNotFound` if no product has this id.
pub async fn get_product<C: ConnectionTrait>(db: &C, product_id: i64) -> Result<product::Model> {
    Product::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or(Error::ProductNotFound { id: product_id })
}

/// Retrieves every category, ordered alphabetically by name.
pub async fn list_categories<C: ConnectionTrait>(db: &C) -> Result<Vec<category::Model>> {
    Category::find()
        .order_by_asc(category::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a category by id.
///
/// # Errors
/// Returns `Error::CategoryNotFound` if no category has this id.
pub async fn get_category<C: ConnectionTrait>(
    db: &C,
    category_id: i64,
) -> Result<category::Model> {
    Category::find_by_id(category_id)
        .one(db)
        .await?
        .ok_or(Error::CategoryNotFound { id: category_id })
}

/// Creates a category. The name is trimmed and must not be empty.
pub async fn create_category<C: ConnectionTrait>(
    db: &C,
    name: String,
    description: String,
) -> Result<category::Model> {
    if name.trim().is_empty() {
        return Err(Error::Config {
            message: "Category name cannot be empty".to_string(),
        });
    }

    category::ActiveModel {
        name: Set(name.trim().to_string()),
        description: Set(description),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

fn validate_price(price: Decimal) -> Result<()> {
    if price < Decimal::ZERO {
        return Err(Error::InvalidPrice { price });
    }
    Ok(())
}

const fn validate_stock(stock: i32) -> Result<()> {
    if stock < 0 {
        return Err(Error::InvalidStock { stock });
    }
    Ok(())
}

/// Creates a product after validating its fields.
///
/// # Errors
/// Returns an error if:
/// - The product name is empty or whitespace-only
/// - The price or stock is negative
/// - `category_id` does not name an existing category
/// - The database insert fails
pub async fn create_product<C: ConnectionTrait>(
    db: &C,
    new: NewProduct,
) -> Result<product::Model> {
    if new.name.trim().is_empty() {
        return Err(Error::Config {
            message: "Product name cannot be empty".to_string(),
        });
    }
    validate_price(new.price)?;
    validate_stock(new.stock)?;

    if let Some(category_id) = new.category_id {
        get_category(db, category_id).await?;
    }

    product::ActiveModel {
        name: Set(new.name.trim().to_string()),
        description: Set(new.description),
        price: Set(new.price),
        stock: Set(new.stock),
        category_id: Set(new.category_id),
        image: Set(new.image),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Sets a new unit price on a product.
pub async fn update_product_price<C: ConnectionTrait>(
    db: &C,
    product_id: i64,
    price: Decimal,
) -> Result<product::Model> {
    validate_price(price)?;
    let mut product: product::ActiveModel = get_product(db, product_id).await?.into();
    product.price = Set(price);
    product.update(db).await.map_err(Into::into)
}

/// Sets the absolute stock level of a product.
pub async fn restock_product<C: ConnectionTrait>(
    db: &C,
    product_id: i64,
    stock: i32,
) -> Result<product::Model> {
    validate_stock(stock)?;
    let mut product: product::ActiveModel = get_product(db, product_id).await?.into();
    product.stock = Set(stock);
    product.update(db).await.map_err(Into::into)
}

/// Deletes a category and clears the reference on every product that used it.
///
/// Products are kept; both steps commit together.
#[instrument(skip(db))]
pub async fn delete_category(db: &DatabaseConnection, category_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    let category = get_category(&txn, category_id).await?;

    let detached = Product::update_many()
        .col_expr(
            product::Column::CategoryId,
            Expr::value(Option::<i64>::None),
        )
        .filter(product::Column::CategoryId.eq(category_id))
        .exec(&txn)
        .await?;

    category.delete(&txn).await?;
    txn.commit().await?;

    info!(
        "Deleted category {category_id}, detached {} products",
        detached.rows_affected
    );
    Ok(())
}

/// Deletes a product and clears the reference on every order line that used it.
///
/// Order lines are kept so completed orders retain their quantities; both steps
/// commit together.
#[instrument(skip(db))]
pub async fn delete_product(db: &DatabaseConnection, product_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    let product = get_product(&txn, product_id).await?;

    let detached = OrderItem::update_many()
        .col_expr(
            order_item::Column::ProductId,
            Expr::value(Option::<i64>::None),
        )
        .filter(order_item::Column::ProductId.eq(product_id))
        .exec(&txn)
        .await?;

    product.delete(&txn).await?;
    txn.commit().await?;

    info!(
        "Deleted product {product_id}, detached {} order lines",
        detached.rows_affected
    );
    Ok(())
}
