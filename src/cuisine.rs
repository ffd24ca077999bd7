//! # Cuisines
//!
//! Validation, normalization and CRUD orchestration for the `cuisines` collection.
//!
//! Cuisines carry a human-readable `slug` that must be unique across the collection. It
//! is derived from the name when a client does not supply one ([`slugify`]) and always
//! stored trimmed and lowercase.
//!
//! Uniqueness is an application-level read-then-write check. Two concurrent requests
//! claiming the same slug can both pass it; there is no unique index behind it.

use std::sync::Arc;

use axum::Router;
use axum::extract::rejection::PathRejection;
use axum::extract::{Path, Query, State};
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

const UPDATABLE_FIELDS: &[&str] = &["name", "slug", "region"];

/// Derives a slug from a display name.
///
/// The name is trimmed and lowercased, whitespace runs become single hyphens, and every
/// character that is neither alphanumeric nor a hyphen is dropped. A name without any
/// alphanumeric content yields an empty slug.
///
/// ```rust
/// use kitchen::slugify;
///
/// assert_eq!(slugify("Chinese Food"), "chinese-food");
/// assert_eq!(slugify("  Tex-Mex   (Modern) "), "tex-mex-modern");
/// assert_eq!(slugify("!!!"), "");
/// ```
pub fn slugify(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-')
        .collect()
}

fn normalize_slug(slug: &str) -> String {
    slug.trim().to_lowercase()
}

/////////////////////////////////////////////// Types //////////////////////////////////////////////////

/// A stored cuisine as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cuisine {
    /// Store-assigned identifier, serialized as `_id`.
    #[serde(rename = "_id")]
    pub id: ObjectId,
    /// Non-empty, trimmed display name.
    pub name: String,
    /// Unique lowercase slug.
    pub slug: String,
    /// Region, possibly empty.
    #[serde(default)]
    pub region: String,
}

/// A validated create payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewCuisine {
    /// Trimmed, non-empty name.
    pub name: String,
    /// Normalized slug, explicit or derived from the name.
    pub slug: String,
    /// Region; empty when omitted or null.
    pub region: String,
}

impl NewCuisine {
    /// Validates a create payload.
    ///
    /// An absent or null `slug` is derived from the name. Either way the slug must be
    /// non-empty, so a name with no alphanumeric content is rejected unless a slug is
    /// given explicitly.
    pub fn from_payload(payload: &Value) -> Result<Self, ValidationError> {
        let object = validate::require_object(payload)?;
        let name = object
            .get("name")
            .and_then(validate::non_blank)
            .ok_or_else(|| ValidationError::MissingRequired {
                field: "name".to_string(),
            })?;

        let slug = match object.get("slug") {
            None | Some(Value::Null) => Value::String(slugify(&name)),
            Some(explicit) => explicit.clone(),
        };
        let slug = validate::non_blank(&slug).ok_or_else(|| ValidationError::EmptyIfProvided {
            field: "slug".to_string(),
        })?;

        let region = match object.get("region") {
            Some(value) => validate::string_or_null("region", value)?,
            None => String::new(),
        };

        Ok(Self {
            name,
            slug: normalize_slug(&slug),
            region,
        })
    }
}

/// A validated partial update. Only the fields that are `Some` are written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CuisineChanges {
    /// New name, trimmed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New slug, normalized.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    /// New region; an explicit null clears it to the empty string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl CuisineChanges {
    /// Validates an update payload.
    ///
    /// Any key outside `name`, `slug` and `region` rejects the whole payload.
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
        if let Some(value) = object.get("slug") {
            let slug = validate::non_blank(value).ok_or_else(|| ValidationError::Empty {
                field: "slug".to_string(),
            })?;
            changes.slug = Some(normalize_slug(&slug));
        }
        if let Some(value) = object.get("region") {
            changes.region = Some(validate::string_or_null("region", value)?);
        }

        if changes.is_empty() {
            return Err(ValidationError::NoFields);
        }
        Ok(changes)
    }

    /// Whether no field would be written.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.slug.is_none() && self.region.is_none()
    }
}

/// Response body for `GET /cuisines`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CuisineList {
    /// Cuisines, newest first.
    pub cuisines: Vec<Cuisine>,
}

/// Query string accepted by `GET /cuisines`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CuisineQuery {
    /// Restricts the listing to one slug; blank means no restriction.
    pub slug: Option<String>,
}

impl CuisineQuery {
    /// Builds the query from raw key/value pairs. A repeated `slug` keeps its first value
    /// and unknown keys are ignored.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let slug = pairs
            .into_iter()
            .find_map(|(key, value)| (key == "slug").then_some(value));
        Self { slug }
    }
}

//////////////////////////////////////////// Controller ////////////////////////////////////////////////

/// Cuisine operations over a shared [`DocumentStore`].
#[derive(Clone)]
pub struct CuisineController {
    store: Arc<dyn DocumentStore>,
}

impl CuisineController {
    /// Creates a controller over `store`.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Lists cuisines newest first, optionally restricted to one slug.
    ///
    /// The slug filter is trimmed and lowercased before matching; an empty filter lists
    /// everything.
    pub async fn list_cuisines(&self, slug: Option<&str>) -> Result<Vec<Cuisine>, ApiError> {
        let filter = match slug {
            Some(slug) if !slug.is_empty() => {
                Filter::new().field_eq("slug", Value::String(normalize_slug(slug)))
            }
            _ => Filter::new(),
        };
        let documents = self
            .store
            .list(Collection::Cuisines, &filter, &Order::default())
            .await?;
        documents
            .into_iter()
            .map(|doc| doc.decode().map_err(ApiError::from))
            .collect()
    }

    /// Validates and stores a new cuisine, returning it as stored.
    pub async fn create_cuisine(&self, payload: &Value) -> Result<Cuisine, ApiError> {
        let cuisine = NewCuisine::from_payload(payload).inspect_err(log_rejection)?;
        self.ensure_slug_free(&cuisine.slug, None).await?;
        let id = self
            .store
            .insert(Collection::Cuisines, encode_fields(&cuisine)?)
            .await?;
        tracing::info!(cuisine_id = %id, slug = %cuisine.slug, "created cuisine");
        self.fetch(&id).await?.ok_or_else(not_found)
    }

    /// Fetches one cuisine by its identifier text.
    pub async fn get_cuisine(&self, id_text: &str) -> Result<Cuisine, ApiError> {
        let id = parse_id(id_text)?;
        self.fetch(&id).await?.ok_or_else(not_found)
    }

    /// Applies a partial update and returns the cuisine as stored afterwards.
    ///
    /// A new slug is checked against every other cuisine before anything is written.
    pub async fn update_cuisine(
        &self,
        id_text: &str,
        payload: &Value,
    ) -> Result<Cuisine, ApiError> {
        let id = parse_id(id_text)?;
        let changes = CuisineChanges::from_payload(payload).inspect_err(log_rejection)?;
        if let Some(slug) = &changes.slug {
            self.ensure_slug_free(slug, Some(id)).await?;
        }
        let matched = self
            .store
            .update_fields(Collection::Cuisines, &id, encode_fields(&changes)?)
            .await?;
        if !matched {
            return Err(not_found());
        }
        tracing::info!(cuisine_id = %id, "updated cuisine");
        self.fetch(&id).await?.ok_or_else(not_found)
    }

    /// Deletes one cuisine.
    pub async fn delete_cuisine(&self, id_text: &str) -> Result<Deleted, ApiError> {
        let id = parse_id(id_text)?;
        if !self.store.delete(Collection::Cuisines, &id).await? {
            return Err(not_found());
        }
        tracing::info!(cuisine_id = %id, "deleted cuisine");
        Ok(Deleted::new(id_text))
    }

    async fn ensure_slug_free(&self, slug: &str, except: Option<ObjectId>) -> Result<(), ApiError> {
        let mut filter = Filter::new().field_eq("slug", Value::String(slug.to_string()));
        if let Some(id) = except {
            filter = filter.id_ne(id);
        }
        match self.store.find_one(Collection::Cuisines, &filter).await? {
            Some(existing) => {
                tracing::debug!(slug, existing = %existing.id, "cuisine slug taken");
                Err(ApiError::Conflict(format!(
                    "Cuisine slug '{slug}' already exists."
                )))
            }
            None => Ok(()),
        }
    }

    async fn fetch(&self, id: &ObjectId) -> Result<Option<Cuisine>, ApiError> {
        let document = self
            .store
            .find_one(Collection::Cuisines, &Filter::by_id(*id))
            .await?;
        Ok(document.map(|doc| doc.decode::<Cuisine>()).transpose()?)
    }
}

fn parse_id(text: &str) -> Result<ObjectId, ApiError> {
    object_id::decode(text).map_err(|e| {
        tracing::debug!(id = text, error = %e, "rejected cuisine id");
        invalid_id()
    })
}

/// Unwraps the path segment, mapping extractor failures (such as invalid percent-encoded
/// UTF-8) to the same response as an undecodable id.
fn path_id(path: Result<Path<String>, PathRejection>) -> Result<String, ApiError> {
    path.map(|Path(id)| id).map_err(|rejection| {
        tracing::debug!(error = %rejection, "rejected cuisine path");
        invalid_id()
    })
}

fn invalid_id() -> ApiError {
    ApiError::BadRequest("Invalid cuisine id format.".to_string())
}

fn not_found() -> ApiError {
    ApiError::NotFound("Cuisine not found.".to_string())
}

fn log_rejection(err: &ValidationError) {
    tracing::debug!(field = err.field(), error = %err, "rejected cuisine payload");
}

////////////////////////////////////////////// Handlers ////////////////////////////////////////////////

async fn get_cuisines(
    State(controller): State<CuisineController>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<CuisineList>, ApiError> {
    let query = CuisineQuery::from_pairs(pairs);
    let cuisines = controller.list_cuisines(query.slug.as_deref()).await?;
    Ok(Json(CuisineList { cuisines }))
}

async fn post_cuisine(
    State(controller): State<CuisineController>,
    Payload(payload): Payload,
) -> Result<(StatusCode, Json<Cuisine>), ApiError> {
    let cuisine = controller.create_cuisine(&payload).await?;
    Ok((StatusCode::CREATED, Json(cuisine)))
}

async fn get_cuisine_by_id(
    State(controller): State<CuisineController>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Cuisine>, ApiError> {
    let cuisine_id = path_id(path)?;
    Ok(Json(controller.get_cuisine(&cuisine_id).await?))
}

async fn patch_cuisine_by_id(
    State(controller): State<CuisineController>,
    path: Result<Path<String>, PathRejection>,
    Payload(payload): Payload,
) -> Result<Json<Cuisine>, ApiError> {
    let cuisine_id = path_id(path)?;
    Ok(Json(controller.update_cuisine(&cuisine_id, &payload).await?))
}

async fn delete_cuisine_by_id(
    State(controller): State<CuisineController>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Deleted>, ApiError> {
    let cuisine_id = path_id(path)?;
    Ok(Json(controller.delete_cuisine(&cuisine_id).await?))
}

/// Creates the router for `/cuisines`.
pub fn create_cuisine_router(store: Arc<dyn DocumentStore>) -> Router {
    Router::new()
        .route("/cuisines", get(get_cuisines).post(post_cuisine))
        .route(
            "/cuisines/:cuisine_id",
            get(get_cuisine_by_id)
                .patch(patch_cuisine_by_id)
                .delete(delete_cuisine_by_id),
        )
        .with_state(CuisineController::new(store))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::test_utils::test_helpers::{RecordingStore, test_data_store};

    fn controller() -> CuisineController {
        CuisineController::new(test_data_store())
    }

    #[test]
    fn slugify_examples() {
        assert_eq!(slugify("Chinese Food"), "chinese-food");
        assert_eq!(slugify("  Sichuan\t\nHot  Pot "), "sichuan-hot-pot");
        assert_eq!(slugify("Côte d'Ivoire"), "côte-divoire");
        assert_eq!(slugify("---"), "---");
        assert_eq!(slugify("&&& ***"), "-");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn query_keeps_first_slug() {
        let pair = |k: &str, v: &str| (k.to_string(), v.to_string());
        let query = CuisineQuery::from_pairs(vec![
            pair("page", "2"),
            pair("slug", "thai"),
            pair("slug", "greek"),
        ]);
        assert_eq!(query.slug.as_deref(), Some("thai"));
        assert_eq!(
            CuisineQuery::from_pairs(vec![pair("page", "2")]),
            CuisineQuery::default()
        );
    }

    #[test]
    fn derived_slug() {
        let cuisine = NewCuisine::from_payload(&json!({"name": "Chinese Food"})).unwrap();
        assert_eq!(cuisine.slug, "chinese-food");
        assert_eq!(cuisine.region, "");

        let cuisine =
            NewCuisine::from_payload(&json!({"name": "Thai", "slug": null, "region": null}))
                .unwrap();
        assert_eq!(cuisine.slug, "thai");
        assert_eq!(cuisine.region, "");
    }

    #[test]
    fn explicit_slug_is_normalized() {
        let cuisine =
            NewCuisine::from_payload(&json!({"name": "Thai", "slug": "  Siam-Street "})).unwrap();
        assert_eq!(cuisine.slug, "siam-street");
    }

    #[test]
    fn empty_derived_slug_is_rejected() {
        let err = NewCuisine::from_payload(&json!({"name": "!!!"})).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Field 'slug' must be a non-empty string if provided."
        );
        assert!(NewCuisine::from_payload(&json!({"name": "!!!", "slug": "bang"})).is_ok());
    }

    #[test]
    fn bad_explicit_slug_is_rejected() {
        for slug in [json!(""), json!("   "), json!(42), json!(["thai"])] {
            assert_eq!(
                NewCuisine::from_payload(&json!({"name": "Thai", "slug": slug})),
                Err(ValidationError::EmptyIfProvided {
                    field: "slug".into()
                })
            );
        }
    }

    #[test]
    fn region_must_be_a_string() {
        assert_eq!(
            NewCuisine::from_payload(&json!({"name": "Thai", "region": 1})),
            Err(ValidationError::NotString {
                field: "region".into()
            })
        );
        assert_eq!(
            CuisineChanges::from_payload(&json!({"region": false})),
            Err(ValidationError::NotString {
                field: "region".into()
            })
        );
    }

    #[test]
    fn changes() {
        let changes =
            CuisineChanges::from_payload(&json!({"slug": " THAI ", "region": null})).unwrap();
        assert_eq!(changes.slug.as_deref(), Some("thai"));
        assert_eq!(changes.region.as_deref(), Some(""));
        assert_eq!(changes.name, None);

        assert_eq!(
            CuisineChanges::from_payload(&json!({"slug": " "})),
            Err(ValidationError::Empty {
                field: "slug".into()
            })
        );
        assert_eq!(
            CuisineChanges::from_payload(&json!({"origin": "x"})),
            Err(ValidationError::NotUpdatable {
                field: "origin".into()
            })
        );
        assert_eq!(
            CuisineChanges::from_payload(&json!({})),
            Err(ValidationError::NoFields)
        );
    }

    #[tokio::test]
    async fn create_derives_and_stores_slug() {
        let controller = controller();
        let created = controller
            .create_cuisine(&json!({"name": "Chinese Food"}))
            .await
            .unwrap();
        assert_eq!(created.slug, "chinese-food");
        assert_eq!(
            controller
                .get_cuisine(&created.id.to_string())
                .await
                .unwrap(),
            created
        );
    }

    #[tokio::test]
    async fn duplicate_slug_conflicts() {
        let controller = controller();
        controller
            .create_cuisine(&json!({"name": "Thai", "slug": "thai"}))
            .await
            .unwrap();
        let err = controller
            .create_cuisine(&json!({"name": "Thai Street", "slug": "THAI"}))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ApiError::Conflict("Cuisine slug 'thai' already exists.".into())
        );
        assert_eq!(controller.list_cuisines(Some("thai")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_slug_conflicts_only_with_other_cuisines() {
        let controller = controller();
        let thai = controller
            .create_cuisine(&json!({"name": "Thai"}))
            .await
            .unwrap();
        let greek = controller
            .create_cuisine(&json!({"name": "Greek"}))
            .await
            .unwrap();

        let unchanged = controller
            .update_cuisine(&thai.id.to_string(), &json!({"slug": "Thai"}))
            .await
            .unwrap();
        assert_eq!(unchanged.slug, "thai");

        let err = controller
            .update_cuisine(&greek.id.to_string(), &json!({"slug": "thai"}))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ApiError::Conflict("Cuisine slug 'thai' already exists.".into())
        );
        assert_eq!(
            controller.get_cuisine(&greek.id.to_string()).await.unwrap(),
            greek
        );
    }

    #[tokio::test]
    async fn update_region_null_clears_it() {
        let controller = controller();
        let created = controller
            .create_cuisine(&json!({"name": "Greek", "region": "Europe"}))
            .await
            .unwrap();
        let updated = controller
            .update_cuisine(&created.id.to_string(), &json!({"region": null}))
            .await
            .unwrap();
        assert_eq!(updated.region, "");
        assert_eq!(updated.name, "Greek");
    }

    #[tokio::test]
    async fn list_filters_by_normalized_slug() {
        let controller = controller();
        controller
            .create_cuisine(&json!({"name": "Thai"}))
            .await
            .unwrap();
        controller
            .create_cuisine(&json!({"name": "Greek"}))
            .await
            .unwrap();

        let found = controller.list_cuisines(Some("  THAI ")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Thai");

        assert_eq!(controller.list_cuisines(Some("")).await.unwrap().len(), 2);
        assert_eq!(controller.list_cuisines(None).await.unwrap().len(), 2);
        assert!(
            controller
                .list_cuisines(Some("italian"))
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let controller = controller();
        let created = controller
            .create_cuisine(&json!({"name": "Thai"}))
            .await
            .unwrap();
        let id = created.id.to_string();

        assert_eq!(
            controller.delete_cuisine(&id).await.unwrap(),
            Deleted::new(id.clone())
        );
        let expected = ApiError::NotFound("Cuisine not found.".into());
        assert_eq!(controller.get_cuisine(&id).await.unwrap_err(), expected);
        assert_eq!(controller.delete_cuisine(&id).await.unwrap_err(), expected);
    }

    #[tokio::test]
    async fn invalid_ids_never_reach_the_store() {
        let store = RecordingStore::new();
        let controller = CuisineController::new(store.clone());
        let expected = ApiError::BadRequest("Invalid cuisine id format.".into());

        assert_eq!(controller.get_cuisine("xyz").await.unwrap_err(), expected);
        assert_eq!(
            controller
                .update_cuisine("xyz", &json!({"slug": "thai"}))
                .await
                .unwrap_err(),
            expected
        );
        assert_eq!(
            controller.delete_cuisine("xyz").await.unwrap_err(),
            expected
        );
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn rejected_payload_never_reaches_the_store() {
        let store = RecordingStore::new();
        let controller = CuisineController::new(store.clone());
        controller
            .create_cuisine(&json!({"name": "Thai", "region": 3}))
            .await
            .unwrap_err();
        assert_eq!(store.calls(), 0);
    }
}
