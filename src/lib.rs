//! # Kitchen: Recipes and Cuisines over a Document Store
//!
//! Kitchen is a small HTTP service for two kinds of documents: recipes and cuisines.
//! Clients send loosely-typed JSON; the service validates and normalizes it, stores it
//! in a document store, and returns documents with their identifier rendered as a
//! string.
//!
//! This crate provides:
//!
//! - **Identifier Codec**: 12-byte [`ObjectId`]s with a 24-character hex form, decoded
//!   before any store access so malformed identifiers never reach the backend
//! - **Document Store**: the [`DocumentStore`] trait with in-memory and PostgreSQL
//!   implementations
//! - **Resource Controllers**: [`RecipeController`] and [`CuisineController`], which turn
//!   raw payloads into validated structs and orchestrate store calls
//! - **HTTP API**: axum routers for `/recipes`, `/cuisines`, `/health` and `/db/health`
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ HTTP API Layer (Axum routes)            │
//! ├─────────────────────────────────────────┤
//! │ Controllers (validate, orchestrate)     │
//! ├─────────────────────────────────────────┤
//! │ Serializer (Document ⇅ typed resource)  │
//! ├─────────────────────────────────────────┤
//! │ Document Store (trait-based)            │
//! └─────────────────────────────────────────┘
//! ```
//!
//! The store is constructed once at startup and handed to every controller as an
//! `Arc<dyn DocumentStore>`. Nothing in the crate reaches for global state.
//!
//! ## Usage Examples
//!
//! ### Recipes
//!
//! ```rust
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! use std::sync::Arc;
//! use kitchen::{ApiError, InMemoryDocumentStore, RecipeController};
//! use serde_json::json;
//!
//! let recipes = RecipeController::new(Arc::new(InMemoryDocumentStore::new()));
//!
//! let created = recipes
//!     .create_recipe(&json!({"name": "Tomato Egg", "tags": ["quick"]}))
//!     .await
//!     .unwrap();
//! assert!(created.ingredients.is_empty());
//!
//! let fetched = recipes.get_recipe(&created.id.to_string()).await.unwrap();
//! assert_eq!(fetched, created);
//!
//! let err = recipes.get_recipe("not-a-valid-id").await.unwrap_err();
//! assert_eq!(err, ApiError::BadRequest("Invalid recipe id format.".into()));
//! # }
//! ```
//!
//! ### Cuisines
//!
//! ```rust
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! use std::sync::Arc;
//! use kitchen::{CuisineController, InMemoryDocumentStore};
//! use serde_json::json;
//!
//! let cuisines = CuisineController::new(Arc::new(InMemoryDocumentStore::new()));
//!
//! let created = cuisines.create_cuisine(&json!({"name": "Chinese Food"})).await.unwrap();
//! assert_eq!(created.slug, "chinese-food");
//!
//! // Slugs are unique across the collection.
//! assert!(cuisines.create_cuisine(&json!({"name": "Chinese food"})).await.is_err());
//! # }
//! ```
//!
//! ### Serving
//!
//! ```rust,no_run
//! # async fn serve() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//! use kitchen::{InMemoryDocumentStore, create_router};
//!
//! let app = create_router(Arc::new(InMemoryDocumentStore::new()));
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:5000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
mod cuisine;
mod data_store;
mod document;
mod errors;
mod health;
mod payload;
mod recipe;
mod router;
mod test_utils;

pub mod config;
pub mod logging;
pub mod object_id;
pub mod sql;
pub mod validate;

/// Command-line interface utilities for program termination.
///
/// Shared by the kitchen binaries for consistent error reporting.
pub mod cli_utils;

pub use config::{ServerConfig, StoreConfig};
pub use cuisine::{
    Cuisine, CuisineChanges, CuisineController, CuisineList, CuisineQuery, NewCuisine,
    create_cuisine_router, slugify,
};
pub use data_store::{DocumentStore, InMemoryDocumentStore};
pub use document::{
    Collection, Condition, Deleted, Direction, Document, Fields, Filter, ID_FIELD, Order,
    SortKey, encode_fields,
};
pub use errors::{ApiError, StoreError};
pub use health::{HealthStatus, StoreHealth, create_health_router};
pub use logging::{LogFormat, LoggingConfig};
pub use object_id::{ObjectId, ObjectIdParseError};
pub use payload::Payload;
pub use recipe::{
    NewRecipe, Recipe, RecipeChanges, RecipeController, RecipeList, create_recipe_router,
};
pub use router::create_router;
pub use sql::PostgresDocumentStore;
pub use validate::ValidationError;
