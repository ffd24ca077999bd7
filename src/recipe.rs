//! # Recipes
//!
//! Validation, normalization and CRUD orchestration for the `recipes` collection.
//!
//! Every request follows the same path: the identifier in the URL (if any) is decoded
//! first, then the body is validated into a [`NewRecipe`] or [`RecipeChanges`], and only
//! then is the store touched. A rejected request never writes anything.
//!
//! ## HTTP Surface
//!
//! | Method | Path | Success |
//! |---|---|---|
//! | GET | /recipes | 200 `{"recipes": [..]}` |
//! | POST | /recipes | 201 recipe |
//! | GET | /recipes/:recipe_id | 200 recipe |
//! | PATCH | /recipes/:recipe_id | 200 recipe |
//! | DELETE | /recipes/:recipe_id | 200 `{"deleted": true, "id": ..}` |

use std::sync::Arc;

use axum::Router;
use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::get;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::object_id;
use crate::validate::{self, ValidationError};
use crate::{
    ApiError, Collection, Deleted, DocumentStore, Filter, ObjectId, Order, Payload, encode_fields,
};

const UPDATABLE_FIELDS: &[&str] = &["name", "ingredients", "steps", "tags"];

/////////////////////////////////////////////// Types //////////////////////////////////////////////////

/// A stored recipe as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    /// Store-assigned identifier, serialized as `_id`.
    #[serde(rename = "_id")]
    pub id: ObjectId,
    /// Non-empty, trimmed display name.
    pub name: String,
    /// Ingredient lines.
    #[serde(default)]
    pub ingredients: Vec<String>,
    /// Preparation steps.
    #[serde(default)]
    pub steps: Vec<String>,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A validated create payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRecipe {
    /// Trimmed, non-empty name.
    pub name: String,
    /// Ingredient lines; empty when omitted.
    pub ingredients: Vec<String>,
    /// Preparation steps; empty when omitted.
    pub steps: Vec<String>,
    /// Tags; empty when omitted.
    pub tags: Vec<String>,
}

impl NewRecipe {
    /// Validates a create payload.
    ///
    /// ```rust
    /// use kitchen::NewRecipe;
    /// use serde_json::json;
    ///
    /// let recipe = NewRecipe::from_payload(&json!({"name": "  Oatmeal Bowl "})).unwrap();
    /// assert_eq!(recipe.name, "Oatmeal Bowl");
    /// assert!(recipe.tags.is_empty());
    /// ```
    pub fn from_payload(payload: &Value) -> Result<Self, ValidationError> {
        let object = validate::require_object(payload)?;
        let name = object
            .get("name")
            .and_then(validate::non_blank)
            .ok_or_else(|| ValidationError::MissingRequired {
                field: "name".to_string(),
            })?;
        Ok(Self {
            name,
            ingredients: validate::optional_string_list(object, "ingredients")?,
            steps: validate::optional_string_list(object, "steps")?,
            tags: validate::optional_string_list(object, "tags")?,
        })
    }
}

/// A validated partial update. Only the fields that are `Some` are written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecipeChanges {
    /// New name, trimmed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Replacement ingredient list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<Vec<String>>,
    /// Replacement step list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<String>>,
    /// Replacement tag list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl RecipeChanges {
    /// Validates an update payload.
    ///
    /// Any key outside `name`, `ingredients`, `steps` and `tags` rejects the whole payload.
    pub fn from_payload(payload: &Value) -> Result<Self, ValidationError> {
        let object = validate::require_object(payload)?;
        validate::reject_unknown_fields(object, UPDATABLE_FIELDS)?;

        let mut changes = Self::default();
        if let Some(value) = object.get("name") {
            let name = validate::non_blank(value).ok_or_else(|| ValidationError::Empty {
                field: "name".to_string(),
            })?;
            changes.name = Some(name);
        }
        if let Some(value) = object.get("ingredients") {
            changes.ingredients = Some(validate::string_list("ingredients", value)?);
        }
        if let Some(value) = object.get("steps") {
            changes.steps = Some(validate::string_list("steps", value)?);
        }
        if let Some(value) = object.get("tags") {
            changes.tags = Some(validate::string_list("tags", value)?);
        }

        if changes.is_empty() {
            return Err(ValidationError::NoFields);
        }
        Ok(changes)
    }

    /// Whether no field would be written.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.ingredients.is_none()
            && self.steps.is_none()
            && self.tags.is_none()
    }
}

/// Response body for `GET /recipes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeList {
    /// Recipes, newest first.
    pub recipes: Vec<Recipe>,
}

//////////////////////////////////////////// Controller ////////////////////////////////////////////////

/// Recipe operations over a shared [`DocumentStore`].
///
/// The controller holds no state of its own; cloning it clones the store handle.
#[derive(Clone)]
pub struct RecipeController {
    store: Arc<dyn DocumentStore>,
}

impl RecipeController {
    /// Creates a controller over `store`.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Lists every recipe, newest first.
    pub async fn list_recipes(&self) -> Result<Vec<Recipe>, ApiError> {
        let documents = self
            .store
            .list(Collection::Recipes, &Filter::new(), &Order::default())
            .await?;
        documents
            .into_iter()
            .map(|doc| doc.decode().map_err(ApiError::from))
            .collect()
    }

    /// Validates and stores a new recipe, returning it as stored.
    pub async fn create_recipe(&self, payload: &Value) -> Result<Recipe, ApiError> {
        let recipe = NewRecipe::from_payload(payload).inspect_err(log_rejection)?;
        let id = self
            .store
            .insert(Collection::Recipes, encode_fields(&recipe)?)
            .await?;
        tracing::info!(recipe_id = %id, name = %recipe.name, "created recipe");
        self.fetch(&id).await?.ok_or_else(not_found)
    }

    /// Fetches one recipe by its identifier text.
    pub async fn get_recipe(&self, id_text: &str) -> Result<Recipe, ApiError> {
        let id = parse_id(id_text)?;
        self.fetch(&id).await?.ok_or_else(not_found)
    }

    /// Applies a partial update and returns the recipe as stored afterwards.
    pub async fn update_recipe(&self, id_text: &str, payload: &Value) -> Result<Recipe, ApiError> {
        let id = parse_id(id_text)?;
        let changes = RecipeChanges::from_payload(payload).inspect_err(log_rejection)?;
        let matched = self
            .store
            .update_fields(Collection::Recipes, &id, encode_fields(&changes)?)
            .await?;
        if !matched {
            return Err(not_found());
        }
        tracing::info!(recipe_id = %id, "updated recipe");
        self.fetch(&id).await?.ok_or_else(not_found)
    }

    /// Deletes one recipe.
    pub async fn delete_recipe(&self, id_text: &str) -> Result<Deleted, ApiError> {
        let id = parse_id(id_text)?;
        if !self.store.delete(Collection::Recipes, &id).await? {
            return Err(not_found());
        }
        tracing::info!(recipe_id = %id, "deleted recipe");
        Ok(Deleted::new(id_text))
    }

    async fn fetch(&self, id: &ObjectId) -> Result<Option<Recipe>, ApiError> {
        let document = self
            .store
            .find_one(Collection::Recipes, &Filter::by_id(*id))
            .await?;
        Ok(document.map(|doc| doc.decode::<Recipe>()).transpose()?)
    }
}

fn parse_id(text: &str) -> Result<ObjectId, ApiError> {
    object_id::decode(text).map_err(|e| {
        tracing::debug!(id = text, error = %e, "rejected recipe id");
        invalid_id()
    })
}

/// Unwraps the path segment, mapping extractor failures (such as invalid percent-encoded
/// UTF-8) to the same response as an undecodable id.
fn path_id(path: Result<Path<String>, PathRejection>) -> Result<String, ApiError> {
    path.map(|Path(id)| id).map_err(|rejection| {
        tracing::debug!(error = %rejection, "rejected recipe path");
        invalid_id()
    })
}

fn invalid_id() -> ApiError {
    ApiError::BadRequest("Invalid recipe id format.".to_string())
}

fn not_found() -> ApiError {
    ApiError::NotFound("Recipe not found.".to_string())
}

fn log_rejection(err: &ValidationError) {
    tracing::debug!(field = err.field(), error = %err, "rejected recipe payload");
}

////////////////////////////////////////////// Handlers ////////////////////////////////////////////////

async fn get_recipes(
    State(controller): State<RecipeController>,
) -> Result<Json<RecipeList>, ApiError> {
    let recipes = controller.list_recipes().await?;
    Ok(Json(RecipeList { recipes }))
}

async fn post_recipe(
    State(controller): State<RecipeController>,
    Payload(payload): Payload,
) -> Result<(StatusCode, Json<Recipe>), ApiError> {
    let recipe = controller.create_recipe(&payload).await?;
    Ok((StatusCode::CREATED, Json(recipe)))
}

async fn get_recipe_by_id(
    State(controller): State<RecipeController>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Recipe>, ApiError> {
    let recipe_id = path_id(path)?;
    Ok(Json(controller.get_recipe(&recipe_id).await?))
}

async fn patch_recipe_by_id(
    State(controller): State<RecipeController>,
    path: Result<Path<String>, PathRejection>,
    Payload(payload): Payload,
) -> Result<Json<Recipe>, ApiError> {
    let recipe_id = path_id(path)?;
    Ok(Json(controller.update_recipe(&recipe_id, &payload).await?))
}

async fn delete_recipe_by_id(
    State(controller): State<RecipeController>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Deleted>, ApiError> {
    let recipe_id = path_id(path)?;
    Ok(Json(controller.delete_recipe(&recipe_id).await?))
}

/// Creates the router for `/recipes`.
pub fn create_recipe_router(store: Arc<dyn DocumentStore>) -> Router {
    Router::new()
        .route("/recipes", get(get_recipes).post(post_recipe))
        .route(
            "/recipes/:recipe_id",
            get(get_recipe_by_id)
                .patch(patch_recipe_by_id)
                .delete(delete_recipe_by_id),
        )
        .with_state(RecipeController::new(store))
}
