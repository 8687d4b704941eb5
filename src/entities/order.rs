//! Order entity - Either a user's active cart (`complete = false`) or a finalized order.
//!
//! A user has at most one incomplete order at a time; the database enforces this
//! with a partial unique index created in `config::database::create_tables`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Order database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    /// Unique identifier for the order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Subject id from the identity provider, cleared when the identity is removed
    pub user_id: Option<String>,
    /// When the order (cart) was opened
    pub created_at: DateTimeUtc,
    /// Whether checkout has completed
    pub complete: bool,
}

/// Defines relationships between Order and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One order owns many lines
    #[sea_orm(has_many = "super::order_item::Entity")]
    Items,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
