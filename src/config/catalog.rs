//! Catalog seed loading from config.toml
//!
//! The storefront ships without an admin workflow, so the initial catalog is
//! described in a TOML file and inserted on startup. Seeding is keyed by name:
//! categories and products that already exist are left alone, which makes it
//! safe to run on every boot.

use crate::{
    core::catalog::{self, NewProduct},
    entities::{Category, CategoryColumn, Product, ProductColumn},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
pub struct CatalogConfig {
    /// Categories to create
    #[serde(default)]
    pub categories: Vec<CategoryConfig>,
    /// Products to create
    #[serde(default)]
    pub products: Vec<ProductConfig>,
}

/// Configuration for a single category
#[derive(Debug, Deserialize, Clone)]
pub struct CategoryConfig {
    /// Unique display name
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Configuration for a single product
#[derive(Debug, Deserialize, Clone)]
pub struct ProductConfig {
    /// Unique display name, also the seeding key
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Unit price; write it as a string (`"9.99"`) to keep it exact
    pub price: Decimal,
    /// Initial units on hand
    pub stock: i32,
    /// Name of a category declared in the same file or already in the database
    pub category: Option<String>,
    pub image: Option<String>,
}

/// Loads the catalog seed from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CatalogConfig> {
    let path_ref = path.as_ref();
    debug!("Loading catalog seed from {}", path_ref.display());
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read catalog file {}: {e}", path_ref.display()),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {}: {e}", path_ref.display()),
    })
}

/// Inserts every category and product from `config` that is not already present.
///
/// Returns the number of rows inserted.
#[instrument(skip_all)]
pub async fn seed_catalog(db: &DatabaseConnection, config: &CatalogConfig) -> Result<usize> {
    let mut inserted = 0;

    for cfg in &config.categories {
        let exists = Category::find()
            .filter(CategoryColumn::Name.eq(cfg.name.as_str()))
            .one(db)
            .await?
            .is_some();
        if exists {
            debug!("Category '{}' already present, skipping", cfg.name);
            continue;
        }
        catalog::create_category(db, cfg.name.clone(), cfg.description.clone()).await?;
        inserted += 1;
    }

    for cfg in &config.products {
        let exists = Product::find()
            .filter(ProductColumn::Name.eq(cfg.name.as_str()))
            .one(db)
            .await?
            .is_some();
        if exists {
            debug!("Product '{}' already present, skipping", cfg.name);
            continue;
        }

        let category_id = match &cfg.category {
            Some(name) => Some(
                Category::find()
                    .filter(CategoryColumn::Name.eq(name.as_str()))
                    .one(db)
                    .await?
                    .ok_or_else(|| Error::Config {
                        message: format!(
                            "Product '{}' references unknown category '{name}'",
                            cfg.name
                        ),
                    })?
                    .id,
            ),
            None => None,
        };

        catalog::create_product(
            db,
            NewProduct {
                name: cfg.name.clone(),
                description: cfg.description.clone(),
                price: cfg.price,
                stock: cfg.stock,
                category_id,
                image: cfg.image.clone(),
            },
        )
        .await?;
        inserted += 1;
    }

    info!("Catalog seed inserted {inserted} rows");
    Ok(inserted)
}
