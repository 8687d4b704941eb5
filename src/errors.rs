use rust_decimal::Decimal;
use thiserror::Error;

/// Every failure the storefront can report.
///
/// Quantity changes clamp at the product's stock and never report a ceiling error.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid price: {price}")]
    InvalidPrice { price: Decimal },

    #[error("Invalid stock level: {stock}")]
    InvalidStock { stock: i32 },

    #[error("Product not found: {id}")]
    ProductNotFound { id: i64 },

    #[error("Category not found: {id}")]
    CategoryNotFound { id: i64 },

    #[error("Order not found: {id}")]
    OrderNotFound { id: i64 },

    #[error("Order item not found: {id}")]
    OrderItemNotFound { id: i64 },

    #[error("Order item {item_id} belongs to another user")]
    Forbidden { item_id: i64 },

    #[error("Order {order_id} has no items")]
    EmptyCart { order_id: i64 },

    #[error("Authentication required")]
    Unauthenticated,
}

impl Error {
    /// True for every variant that reports a missing record.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ProductNotFound { .. }
                | Self::CategoryNotFound { .. }
                | Self::OrderNotFound { .. }
                | Self::OrderItemNotFound { .. }
        )
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
