//! Route handlers grouped by storefront area.

/// Cart view and mutations
pub mod cart;
/// Product listing and detail
pub mod catalog;
/// Checkout summary and completion
pub mod checkout;
