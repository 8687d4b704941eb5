//! Checkout business logic - Turning the active cart into a completed order.
//!
//! Completion runs in a single database transaction: stock deductions, the
//! `complete` flag and the replacement cart either all commit or none do.
//!
//! Stock is deducted per line with a guarded update
//! (`stock = stock - quantity WHERE stock >= quantity`). A line whose product no
//! longer has enough stock is left untouched and reported in the receipt; the
//! order still completes.

use crate::{
    core::cart::{self, CartLine, CartView},
    entities::{Product, order, product},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde::Serialize;
use tracing::{info, instrument, warn};

/// What the user is about to buy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CheckoutSummary {
    pub order_id: i64,
    pub lines: Vec<CartLine>,
    /// Sum of `quantity * price` over lines whose product still exists
    pub total_price: Decimal,
    /// Sum of quantities over all lines
    pub total_quantity: i32,
}

impl From<CartView> for CheckoutSummary {
    fn from(cart: CartView) -> Self {
        Self {
            order_id: cart.order.id,
            lines: cart.lines,
            total_price: cart.total_price,
            total_quantity: cart.total_quantity,
        }
    }
}

/// Result of a completed checkout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Receipt {
    /// The order as stored after completion
    pub order: order::Model,
    pub summary: CheckoutSummary,
    /// Products whose stock was too low to deduct; their stock is unchanged
    pub short_lines: Vec<i64>,
    /// The fresh, empty cart opened for the user
    pub next_order_id: i64,
}

/// Builds the checkout summary for the user's cart.
///
/// # Errors
/// Returns `Error::EmptyCart` if the cart has no lines. Callers treat this as a
/// redirect back to the cart rather than a failure.
pub async fn prepare_checkout<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
) -> Result<CheckoutSummary> {
    let cart = cart::view_cart(db, user_id).await?;
    if cart.is_empty() {
        return Err(Error::EmptyCart {
            order_id: cart.order.id,
        });
    }
    Ok(cart.into())
}

async fn deduct_stock<C: ConnectionTrait>(db: &C, product_id: i64, quantity: i32) -> Result<bool> {
    let result = Product::update_many()
        .col_expr(
            product::Column::Stock,
            Expr::col(product::Column::Stock).sub(quantity),
        )
        .filter(product::Column::Id.eq(product_id))
        .filter(product::Column::Stock.gte(quantity))
        .exec(db)
        .await?;
    Ok(result.rows_affected == 1)
}

/// Completes the user's active order.
///
/// Deducts stock for every line whose product can cover it, marks the order
/// complete and opens a new empty cart, all in one transaction.
///
/// # Errors
/// Returns `Error::EmptyCart` if the cart has no lines; nothing is changed.
#[instrument(skip(db))]
pub async fn complete_order(db: &DatabaseConnection, user_id: &str) -> Result<Receipt> {
    let txn = db.begin().await?;

    let cart = cart::view_cart(&txn, user_id).await?;
    if cart.is_empty() {
        return Err(Error::EmptyCart {
            order_id: cart.order.id,
        });
    }

    let mut short_lines = Vec::new();
    for line in &cart.lines {
        let Some(product) = &line.product else {
            continue;
        };
        if !deduct_stock(&txn, product.id, line.item.quantity).await? {
            warn!(
                "Order {}: product {} has insufficient stock for {} units, left unchanged",
                cart.order.id, product.id, line.item.quantity
            );
            short_lines.push(product.id);
        }
    }

    let mut completed: order::ActiveModel = cart.order.clone().into();
    completed.complete = Set(true);
    let completed = completed.update(&txn).await?;

    let next = cart::get_or_create_active_order(&txn, user_id).await?;

    txn.commit().await?;

    info!(
        "Completed order {} for user {user_id} ({} lines, {} short), opened cart {}",
        completed.id,
        cart.lines.len(),
        short_lines.len(),
        next.id
    );

    Ok(Receipt {
        order: completed,
        summary: cart.into(),
        short_lines,
        next_order_id: next.id,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::{cart::add_item, catalog};
    use crate::entities::Order;
    use crate::test_utils::*;
    use sea_orm::PaginatorTrait;

    #[tokio::test]
    async fn test_prepare_checkout_empty_cart() -> Result<()> {
        let db = setup_test_db().await?;

        let result = prepare_checkout(&db, "alice").await;
        assert!(matches!(result, Err(Error::EmptyCart { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_prepare_checkout_totals() -> Result<()> {
        let db = setup_test_db().await?;
        let pen = create_custom_product(&db, "Pen", Decimal::new(999, 2), 10, None).await?;
        let book = create_custom_product(&db, "Book", Decimal::new(2000, 2), 10, None).await?;

        add_item(&db, "alice", pen.id).await?;
        add_item(&db, "alice", pen.id).await?;
        add_item(&db, "alice", book.id).await?;

        let summary = prepare_checkout(&db, "alice").await?;
        assert_eq!(summary.total_price, Decimal::new(3998, 2));
        assert_eq!(summary.total_quantity, 3);
        assert_eq!(summary.lines.len(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_complete_order_deducts_stock_and_opens_new_cart() -> Result<()> {
        let db = setup_test_db().await?;
        let cup = create_test_product(&db, "Cup", 5).await?;
        add_item(&db, "alice", cup.id).await?;
        add_item(&db, "alice", cup.id).await?;

        let receipt = complete_order(&db, "alice").await?;

        assert!(receipt.order.complete);
        assert!(receipt.short_lines.is_empty());
        assert_ne!(receipt.next_order_id, receipt.order.id);
        assert_eq!(catalog::get_product(&db, cup.id).await?.stock, 3);

        let next = cart::view_cart(&db, "alice").await?;
        assert_eq!(next.order.id, receipt.next_order_id);
        assert!(next.is_empty());

        let active = Order::find()
            .filter(order::Column::UserId.eq("alice"))
            .filter(order::Column::Complete.eq(false))
            .count(&db)
            .await?;
        assert_eq!(active, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_complete_order_leaves_short_stock_untouched() -> Result<()> {
        let db = setup_test_db().await?;
        let cup = create_test_product(&db, "Cup", 5).await?;
        let pen = create_test_product(&db, "Pen", 5).await?;
        for _ in 0..3 {
            add_item(&db, "alice", cup.id).await?;
        }
        add_item(&db, "alice", pen.id).await?;

        // Stock drops after the cart was filled
        catalog::restock_product(&db, cup.id, 2).await?;

        let receipt = complete_order(&db, "alice").await?;

        assert!(receipt.order.complete);
        assert_eq!(receipt.short_lines, vec![cup.id]);
        assert_eq!(catalog::get_product(&db, cup.id).await?.stock, 2);
        assert_eq!(catalog::get_product(&db, pen.id).await?.stock, 4);
        assert!(cart::view_cart(&db, "alice").await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_complete_order_empty_cart_changes_nothing() -> Result<()> {
        let db = setup_test_db().await?;
        let cart = cart::view_cart(&db, "alice").await?;

        let result = complete_order(&db, "alice").await;
        assert!(matches!(result, Err(Error::EmptyCart { order_id }) if order_id == cart.order.id));

        let order = Order::find_by_id(cart.order.id).one(&db).await?.unwrap();
        assert!(!order.complete);

        Ok(())
    }

    #[tokio::test]
    async fn test_competing_checkouts_never_oversell() -> Result<()> {
        let db = setup_test_db().await?;
        let cup = create_test_product(&db, "Cup", 3).await?;
        for _ in 0..2 {
            add_item(&db, "alice", cup.id).await?;
            add_item(&db, "bob", cup.id).await?;
        }

        let (alice, bob) = tokio::join!(complete_order(&db, "alice"), complete_order(&db, "bob"));
        let shorts = alice?.short_lines.len() + bob?.short_lines.len();

        assert_eq!(shorts, 1);
        assert_eq!(catalog::get_product(&db, cup.id).await?.stock, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_deleted_product_skipped_at_checkout() -> Result<()> {
        let db = setup_test_db().await?;
        let cup = create_test_product(&db, "Cup", 3).await?;
        let pen = create_test_product(&db, "Pen", 3).await?;
        add_item(&db, "alice", cup.id).await?;
        add_item(&db, "alice", pen.id).await?;
        catalog::delete_product(&db, cup.id).await?;

        let receipt = complete_order(&db, "alice").await?;

        assert!(receipt.short_lines.is_empty());
        assert_eq!(receipt.summary.total_quantity, 2);
        assert_eq!(receipt.summary.total_price, Decimal::new(1000, 2));
        assert_eq!(catalog::get_product(&db, pen.id).await?.stock, 2);

        Ok(())
    }
}
