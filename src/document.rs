//! # Stored Documents
//!
//! A [`Document`] is what the store hands back: an [`ObjectId`] plus a flat map of
//! top-level fields. This module also holds the query vocabulary shared by every store
//! backend ([`Collection`], [`Filter`], [`Order`]) and the serializer that maps documents
//! into their external JSON form.
//!
//! ## External Form
//!
//! ```text
//! Document { id: ObjectId, fields: {"name": .., ..} }
//!        ⇅
//! {"_id": "<24 hex chars>", "name": .., ..}
//! ```
//!
//! ```rust
//! use kitchen::{Document, Fields, ObjectId};
//! use serde_json::json;
//!
//! let mut fields = Fields::new();
//! fields.insert("name".into(), json!("Tomato Egg"));
//! let doc = Document::new(ObjectId::new([0u8; 12]), fields);
//!
//! assert_eq!(
//!     serde_json::to_value(&doc).unwrap(),
//!     json!({"_id": "000000000000000000000000", "name": "Tomato Egg"})
//! );
//! ```

use std::cmp::Ordering;
use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::{ObjectId, StoreError};

/// Name of the identifier field in the external JSON form.
pub const ID_FIELD: &str = "_id";

/// Top-level fields of a stored document, excluding its identifier.
pub type Fields = Map<String, Value>;

///////////////////////////////////////////// Collection ///////////////////////////////////////////////

/// The collections this service stores documents in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    /// Recipe documents.
    Recipes,
    /// Cuisine documents.
    Cuisines,
}

impl Collection {
    /// The collection's name as stored by persistent backends.
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Recipes => "recipes",
            Collection::Cuisines => "cuisines",
        }
    }
}

impl Display for Collection {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

////////////////////////////////////////////// Document ////////////////////////////////////////////////

/// A persisted record.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// The store-assigned identifier.
    pub id: ObjectId,
    /// Every other top-level field.
    pub fields: Fields,
}

impl Document {
    /// Creates a document from its parts.
    pub fn new(id: ObjectId, fields: Fields) -> Self {
        Self { id, fields }
    }

    /// Returns the value of a top-level field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// The external JSON form: an object with `_id` rendered as a string.
    pub fn into_json(self) -> Value {
        let mut object = Map::with_capacity(self.fields.len() + 1);
        object.insert(ID_FIELD.to_string(), Value::String(self.id.to_string()));
        object.extend(self.fields);
        Value::Object(object)
    }

    /// Maps the document into a typed resource via its external JSON form.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, StoreError> {
        let id = self.id;
        serde_json::from_value(self.into_json())
            .map_err(|e| StoreError::Corrupt(format!("document {id}: {e}")))
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry(ID_FIELD, &self.id)?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Maps a typed value into storable fields, dropping any `_id` it carries.
pub fn encode_fields<T: Serialize>(value: &T) -> Result<Fields, StoreError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(mut fields)) => {
            fields.remove(ID_FIELD);
            Ok(fields)
        }
        Ok(_) => Err(StoreError::Internal(
            "value does not serialize to an object".to_string(),
        )),
        Err(e) => Err(StoreError::Internal(e.to_string())),
    }
}

/// Response body for a successful delete.
///
/// `id` echoes the identifier exactly as the client sent it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct Deleted {
    /// Always `true`; failures are reported as errors instead.
    pub deleted: bool,
    /// The identifier from the request path.
    pub id: String,
}

impl Deleted {
    /// Acknowledges deletion of `id`.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            deleted: true,
            id: id.into(),
        }
    }
}

/////////////////////////////////////////////// Filter /////////////////////////////////////////////////

/// A single condition in a [`Filter`].
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// A top-level field equals the given value.
    FieldEquals(String, Value),
    /// The document identifier equals the given one.
    IdEquals(ObjectId),
    /// The document identifier differs from the given one.
    IdNotEquals(ObjectId),
}

impl Condition {
    /// Whether a document with `id` and `fields` satisfies this condition.
    pub fn matches(&self, id: &ObjectId, fields: &Fields) -> bool {
        match self {
            Condition::FieldEquals(field, value) => fields.get(field) == Some(value),
            Condition::IdEquals(other) => id == other,
            Condition::IdNotEquals(other) => id != other,
        }
    }
}

/// A conjunction of conditions. The empty filter matches every document.
///
/// ```rust
/// use kitchen::{Filter, ObjectId};
/// use serde_json::json;
///
/// let mine = ObjectId::new([1u8; 12]);
/// let filter = Filter::new().field_eq("slug", json!("thai")).id_ne(mine);
/// assert_eq!(filter.conditions().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    /// The filter that matches everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a filter on a single identifier.
    pub fn by_id(id: ObjectId) -> Self {
        Self::new().id_eq(id)
    }

    /// Adds a field-equality condition.
    pub fn field_eq(mut self, field: impl Into<String>, value: Value) -> Self {
        self.conditions
            .push(Condition::FieldEquals(field.into(), value));
        self
    }

    /// Adds an identifier-equality condition.
    pub fn id_eq(mut self, id: ObjectId) -> Self {
        self.conditions.push(Condition::IdEquals(id));
        self
    }

    /// Adds an identifier-inequality condition.
    pub fn id_ne(mut self, id: ObjectId) -> Self {
        self.conditions.push(Condition::IdNotEquals(id));
        self
    }

    /// The conditions in insertion order.
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Whether a document satisfies every condition.
    pub fn matches(&self, id: &ObjectId, fields: &Fields) -> bool {
        self.conditions.iter().all(|c| c.matches(id, fields))
    }
}

//////////////////////////////////////////////// Order /////////////////////////////////////////////////

/// What to sort listed documents by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKey {
    /// The document identifier, i.e. creation order.
    Id,
    /// A top-level field.
    Field(String),
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Smallest first.
    Ascending,
    /// Largest first.
    Descending,
}

/// Ordering for list operations. Defaults to newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// The sort key.
    pub key: SortKey,
    /// The sort direction.
    pub direction: Direction,
}

impl Order {
    /// Descending by identifier.
    pub fn newest_first() -> Self {
        Self {
            key: SortKey::Id,
            direction: Direction::Descending,
        }
    }

    /// Orders by a top-level field.
    pub fn by_field(field: impl Into<String>, direction: Direction) -> Self {
        Self {
            key: SortKey::Field(field.into()),
            direction,
        }
    }

    /// Compares two documents under this ordering. Ties on a field fall back to the
    /// identifier in the same direction.
    pub fn compare(&self, a: (&ObjectId, &Fields), b: (&ObjectId, &Fields)) -> Ordering {
        let ordering = match &self.key {
            SortKey::Id => a.0.cmp(b.0),
            SortKey::Field(field) => {
                let by_field = compare_values(a.1.get(field), b.1.get(field));
                by_field.then_with(|| a.0.cmp(b.0))
            }
        };
        match self.direction {
            Direction::Ascending => ordering,
            Direction::Descending => ordering.reverse(),
        }
    }
}

impl Default for Order {
    fn default() -> Self {
        Self::newest_first()
    }
}

// missing < null < numbers < strings < booleans < arrays < objects
fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None => 0,
        Some(Value::Null) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(Value::Bool(_)) => 4,
        Some(Value::Array(_)) => 5,
        Some(Value::Object(_)) => 6,
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or_default();
            let y = y.as_f64().unwrap_or_default();
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;
    use crate::test_utils::test_helpers::fields;

    #[derive(Debug, Deserialize, Serialize, PartialEq)]
    struct Named {
        #[serde(rename = "_id")]
        id: ObjectId,
        name: String,
    }

    #[test]
    fn into_json_puts_string_id_alongside_fields() {
        let id = ObjectId::new([0xAB; 12]);
        let doc = Document::new(id, fields(json!({"name": "Thai", "slug": "thai"})));
        assert_eq!(
            doc.into_json(),
            json!({"_id": "abababababababababababab", "name": "Thai", "slug": "thai"})
        );
    }

    #[test]
    fn decode_into_typed_value() {
        let id = ObjectId::new([2u8; 12]);
        let doc = Document::new(id, fields(json!({"name": "Pasta"})));
        let named: Named = doc.decode().unwrap();
        assert_eq!(
            named,
            Named {
                id,
                name: "Pasta".into()
            }
        );
    }

    #[test]
    fn decode_reports_corrupt_documents() {
        let doc = Document::new(ObjectId::new([2u8; 12]), fields(json!({"name": 7})));
        assert!(matches!(
            doc.decode::<Named>(),
            Err(StoreError::Corrupt(_))
        ));
    }

    #[test]
    fn encode_fields_drops_id() {
        let named = Named {
            id: ObjectId::new([3u8; 12]),
            name: "Soup".into(),
        };
        assert_eq!(encode_fields(&named).unwrap(), fields(json!({"name": "Soup"})));
        assert!(encode_fields(&"just a string").is_err());
    }

    #[test]
    fn filter_matching() {
        let a = ObjectId::new([1u8; 12]);
        let b = ObjectId::new([2u8; 12]);
        let doc = fields(json!({"slug": "thai", "region": ""}));

        assert!(Filter::new().matches(&a, &doc));
        assert!(Filter::by_id(a).matches(&a, &doc));
        assert!(!Filter::by_id(b).matches(&a, &doc));
        assert!(Filter::new().field_eq("slug", json!("thai")).matches(&a, &doc));
        assert!(!Filter::new().field_eq("slug", json!("Thai")).matches(&a, &doc));
        assert!(!Filter::new().field_eq("missing", json!(null)).matches(&a, &doc));
        assert!(
            !Filter::new()
                .field_eq("slug", json!("thai"))
                .id_ne(a)
                .matches(&a, &doc)
        );
        assert!(
            Filter::new()
                .field_eq("slug", json!("thai"))
                .id_ne(b)
                .matches(&a, &doc)
        );
    }

    #[test]
    fn default_order_is_newest_first() {
        let older = ObjectId::new([1u8; 12]);
        let newer = ObjectId::new([2u8; 12]);
        let empty = Fields::new();
        assert_eq!(
            Order::default().compare((&newer, &empty), (&older, &empty)),
            Ordering::Less
        );
    }

    #[test]
    fn field_order_ranks_types_and_breaks_ties_by_id() {
        let a = ObjectId::new([1u8; 12]);
        let b = ObjectId::new([2u8; 12]);
        let order = Order::by_field("name", Direction::Ascending);
        let apple = fields(json!({"name": "apple"}));
        let banana = fields(json!({"name": "banana"}));
        let numeric = fields(json!({"name": 10}));
        let missing = Fields::new();

        assert_eq!(order.compare((&b, &apple), (&a, &banana)), Ordering::Less);
        assert_eq!(order.compare((&a, &numeric), (&b, &apple)), Ordering::Less);
        assert_eq!(order.compare((&a, &missing), (&b, &numeric)), Ordering::Less);
        assert_eq!(order.compare((&a, &apple), (&b, &apple)), Ordering::Less);
    }

    #[test]
    fn collection_names() {
        assert_eq!(Collection::Recipes.to_string(), "recipes");
        assert_eq!(Collection::Cuisines.as_str(), "cuisines");
    }
}
