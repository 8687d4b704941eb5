//! Cart business logic - The active-order lifecycle and per-line stock ceiling.
//!
//! Every user has at most one incomplete order (their cart). It is created lazily
//! by [`get_or_create_active_order`], which relies on the partial unique index from
//! `config::database` and resolves a lost insert race by re-reading the winner.
//!
//! Quantity changes never fail at the stock boundary: a request that would push a
//! line past the product's stock is a silent no-op. Increments are guarded updates
//! (`quantity = quantity + 1 WHERE quantity < stock`) executed inside a transaction,
//! so two racing requests cannot both pass the ceiling. A line never holds a zero
//! quantity; decrementing the last unit deletes it.

use crate::{
    core::catalog,
    entities::{Order, OrderItem, Product, order, order_item, product},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{
    QueryOrder, Set, SqlErr, TransactionTrait, prelude::*, sea_query::Expr,
};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

/// One cart line joined with its product.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CartLine {
    pub item: order_item::Model,
    /// `None` once the product has been removed from the catalog
    pub product: Option<product::Model>,
    /// `quantity * price`, zero when the product is gone
    pub subtotal: Decimal,
}

impl CartLine {
    fn new(item: order_item::Model, product: Option<product::Model>) -> Self {
        let subtotal = product
            .as_ref()
            .map_or(Decimal::ZERO, |p| p.price * Decimal::from(item.quantity));
        Self {
            item,
            product,
            subtotal,
        }
    }
}

/// A user's active order with its lines and totals.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CartView {
    pub order: order::Model,
    pub lines: Vec<CartLine>,
    pub total_price: Decimal,
    pub total_quantity: i32,
}

impl CartView {
    fn new(order: order::Model, lines: Vec<CartLine>) -> Self {
        let total_price = lines.iter().map(|line| line.subtotal).sum();
        let total_quantity = lines.iter().map(|line| line.item.quantity).sum();
        Self {
            order,
            lines,
            total_price,
            total_quantity,
        }
    }

    /// True when the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Finds the user's incomplete order, if one exists.
pub async fn find_active_order<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
) -> Result<Option<order::Model>> {
    Order::find()
        .filter(order::Column::UserId.eq(user_id))
        .filter(order::Column::Complete.eq(false))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Returns the user's incomplete order, creating an empty one if none exists.
///
/// Safe to call on every cart request. If a concurrent request inserts the
/// active order first, the unique index rejects this insert and the existing
/// row is read back instead.
pub async fn get_or_create_active_order<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
) -> Result<order::Model> {
    if let Some(existing) = find_active_order(db, user_id).await? {
        return Ok(existing);
    }
    insert_active_order(db, user_id).await
}

/// Inserts a fresh cart for the user, falling back to the row that won the
/// unique index when another request got there first.
async fn insert_active_order<C: ConnectionTrait>(db: &C, user_id: &str) -> Result<order::Model> {
    let inserted = order::ActiveModel {
        user_id: Set(Some(user_id.to_string())),
        created_at: Set(chrono::Utc::now()),
        complete: Set(false),
        ..Default::default()
    }
    .insert(db)
    .await;

    match inserted {
        Ok(order) => {
            debug!("Opened cart {} for user {user_id}", order.id);
            Ok(order)
        }
        Err(err) if is_unique_violation(&err) => {
            debug!("Lost cart creation race for user {user_id}, re-reading");
            find_active_order(db, user_id)
                .await?
                .ok_or_else(|| Error::from(err))
        }
        Err(err) => Err(err.into()),
    }
}

async fn reload_item<C: ConnectionTrait>(db: &C, item_id: i64) -> Result<order_item::Model> {
    OrderItem::find_by_id(item_id)
        .one(db)
        .await?
        .ok_or(Error::OrderItemNotFound { id: item_id })
}

/// Adds one unit to a line unless that would exceed `stock`.
///
/// The guard is evaluated by the database against the row's current quantity,
/// so a racing increment that already reached the ceiling turns this into a no-op.
async fn increment_within_stock<C: ConnectionTrait>(
    db: &C,
    item: &order_item::Model,
    stock: i32,
) -> Result<order_item::Model> {
    let result = OrderItem::update_many()
        .col_expr(
            order_item::Column::Quantity,
            Expr::col(order_item::Column::Quantity).add(1),
        )
        .filter(order_item::Column::Id.eq(item.id))
        .filter(order_item::Column::Quantity.lt(stock))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        debug!(
            "Line {} already at stock ceiling ({stock}), increment skipped",
            item.id
        );
    }

    reload_item(db, item.id).await
}

/// Finds a line by id, restricted to the caller's active order.
///
/// Lines in other users' carts or in completed orders are reported as missing.
async fn find_own_active_line<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
    item_id: i64,
) -> Result<order_item::Model> {
    OrderItem::find_by_id(item_id)
        .inner_join(Order)
        .filter(order::Column::UserId.eq(user_id))
        .filter(order::Column::Complete.eq(false))
        .one(db)
        .await?
        .ok_or(Error::OrderItemNotFound { id: item_id })
}

/// Adds one unit of a product to the user's cart.
///
/// Creates the line on first add. At the stock ceiling the call changes nothing;
/// a product with no stock never gets a line. Returns the line after the change,
/// or `None` when no line exists.
///
/// # Errors
/// Returns `Error::ProductNotFound` if the product does not exist.
#[instrument(skip(db))]
pub async fn add_item(
    db: &DatabaseConnection,
    user_id: &str,
    product_id: i64,
) -> Result<Option<order_item::Model>> {
    let txn = db.begin().await?;

    let product = catalog::get_product(&txn, product_id).await?;
    let order = get_or_create_active_order(&txn, user_id).await?;

    let existing = OrderItem::find()
        .filter(order_item::Column::OrderId.eq(order.id))
        .filter(order_item::Column::ProductId.eq(product_id))
        .one(&txn)
        .await?;

    let line = match existing {
        Some(item) => Some(increment_within_stock(&txn, &item, product.stock).await?),
        None if product.stock > 0 => Some(insert_line(&txn, order.id, &product).await?),
        None => {
            debug!("Product {product_id} is out of stock, nothing added");
            None
        }
    };

    txn.commit().await?;
    Ok(line)
}

async fn insert_line<C: ConnectionTrait>(
    db: &C,
    order_id: i64,
    product: &product::Model,
) -> Result<order_item::Model> {
    let inserted = order_item::ActiveModel {
        order_id: Set(order_id),
        product_id: Set(Some(product.id)),
        quantity: Set(1),
        ..Default::default()
    }
    .insert(db)
    .await;

    match inserted {
        Ok(item) => Ok(item),
        Err(err) if is_unique_violation(&err) => {
            // Another request created the line first; count this add against it
            let item = OrderItem::find()
                .filter(order_item::Column::OrderId.eq(order_id))
                .filter(order_item::Column::ProductId.eq(product.id))
                .one(db)
                .await?
                .ok_or_else(|| Error::from(err))?;
            increment_within_stock(db, &item, product.stock).await
        }
        Err(err) => Err(err.into()),
    }
}

/// Deletes a line from the user's cart.
///
/// Only lines of an incomplete order can be removed; completed orders are history.
///
/// # Errors
/// - `Error::OrderItemNotFound` if the line does not exist or belongs to a completed order
/// - `Error::Forbidden` if the line's order belongs to someone else; nothing is changed
#[instrument(skip(db))]
pub async fn remove_item(db: &DatabaseConnection, user_id: &str, item_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    let item = reload_item(&txn, item_id).await?;
    let order = Order::find_by_id(item.order_id)
        .one(&txn)
        .await?
        .ok_or(Error::OrderNotFound { id: item.order_id })?;

    if order.user_id.as_deref() != Some(user_id) {
        warn!("User {user_id} tried to remove line {item_id} from order {}", order.id);
        return Err(Error::Forbidden { item_id });
    }
    if order.complete {
        debug!("Line {item_id} belongs to completed order {}, not removed", order.id);
        return Err(Error::OrderItemNotFound { id: item_id });
    }

    item.delete(&txn).await?;
    txn.commit().await?;

    debug!("Removed line {item_id} from order {}", order.id);
    Ok(())
}

/// Adds one unit to a line in the user's active order, capped at the product's stock.
///
/// A line whose product was deleted is returned unchanged.
#[instrument(skip(db))]
pub async fn increase_quantity(
    db: &DatabaseConnection,
    user_id: &str,
    item_id: i64,
) -> Result<order_item::Model> {
    let txn = db.begin().await?;

    let item = find_own_active_line(&txn, user_id, item_id).await?;
    let product = match item.product_id {
        Some(product_id) => Product::find_by_id(product_id).one(&txn).await?,
        None => None,
    };

    let item = match product {
        Some(product) => increment_within_stock(&txn, &item, product.stock).await?,
        None => item,
    };

    txn.commit().await?;
    Ok(item)
}

/// Removes one unit from a line in the user's active order.
///
/// When the last unit goes the line is deleted and `None` is returned.
#[instrument(skip(db))]
pub async fn decrease_quantity(
    db: &DatabaseConnection,
    user_id: &str,
    item_id: i64,
) -> Result<Option<order_item::Model>> {
    let txn = db.begin().await?;

    let item = find_own_active_line(&txn, user_id, item_id).await?;

    let decremented = OrderItem::update_many()
        .col_expr(
            order_item::Column::Quantity,
            Expr::col(order_item::Column::Quantity).sub(1),
        )
        .filter(order_item::Column::Id.eq(item.id))
        .filter(order_item::Column::Quantity.gt(1))
        .exec(&txn)
        .await?;

    let line = if decremented.rows_affected == 0 {
        OrderItem::delete_by_id(item.id).exec(&txn).await?;
        debug!("Line {item_id} dropped to zero and was removed");
        None
    } else {
        Some(reload_item(&txn, item.id).await?)
    };

    txn.commit().await?;
    Ok(line)
}

/// Loads the lines of an order joined with their products, oldest line first.
pub async fn load_lines<C: ConnectionTrait>(db: &C, order_id: i64) -> Result<Vec<CartLine>> {
    let rows = OrderItem::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .order_by_asc(order_item::Column::Id)
        .find_also_related(Product)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(item, product)| CartLine::new(item, product))
        .collect())
}

/// Returns the user's cart, opening one if needed.
pub async fn view_cart<C: ConnectionTrait>(db: &C, user_id: &str) -> Result<CartView> {
    let order = get_or_create_active_order(db, user_id).await?;
    let lines = load_lines(db, order.id).await?;
    Ok(CartView::new(order, lines))
}

/// Deletes an order together with all of its lines.
#[instrument(skip(db))]
pub async fn delete_order(db: &DatabaseConnection, order_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    let order = Order::find_by_id(order_id)
        .one(&txn)
        .await?
        .ok_or(Error::OrderNotFound { id: order_id })?;

    let lines = OrderItem::delete_many()
        .filter(order_item::Column::OrderId.eq(order_id))
        .exec(&txn)
        .await?;
    order.delete(&txn).await?;

    txn.commit().await?;
    info!(
        "Deleted order {order_id} with {} lines",
        lines.rows_affected
    );
    Ok(())
}

/// Clears the user reference on every order of a user whose identity was removed.
///
/// Returns the number of orders detached.
#[instrument(skip(db))]
pub async fn detach_user<C: ConnectionTrait>(db: &C, user_id: &str) -> Result<u64> {
    let result = Order::update_many()
        .col_expr(order::Column::UserId, Expr::value(Option::<String>::None))
        .filter(order::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    info!("Detached {} orders from user {user_id}", result.rows_affected);
    Ok(result.rows_affected)
}
