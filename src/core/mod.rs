//! Core business logic - framework-agnostic catalog, cart and checkout operations.
//!
//! Every operation takes a `SeaORM` connection. Functions that only need to read
//! or issue a single statement are generic over `ConnectionTrait`, so they run the
//! same against a pooled connection, an open transaction or a `MockDatabase`.
//! Multi-step operations take a `DatabaseConnection` and open their own transaction.

/// Categories and products
pub mod catalog;

/// Active order lifecycle and quantity rules
pub mod cart;

/// Cart completion and stock deduction
pub mod checkout;
