//! # Document Identifiers
//!
//! Every stored document is keyed by an [`ObjectId`]: a 12-byte value assigned by the
//! store at insert time. Its canonical string form is 24 lowercase hexadecimal characters,
//! which is what clients see in the `_id` field and what they send back in URL paths.
//!
//! ## Layout
//!
//! ```text
//! ┌──────────────┬──────────────────┬──────────────┐
//! │ 4 bytes      │ 5 bytes          │ 3 bytes      │
//! │ unix seconds │ process-random   │ counter      │
//! └──────────────┴──────────────────┴──────────────┘
//! ```
//!
//! All fields are big-endian, so comparing two identifiers byte-wise orders them by
//! creation time. Stores rely on this for their newest-first default ordering.
//!
//! ## Usage Examples
//!
//! ```rust
//! use kitchen::ObjectId;
//!
//! let id = ObjectId::new([0u8; 12]);
//! assert_eq!(id.to_string(), "000000000000000000000000");
//!
//! let parsed: ObjectId = "000000000000000000000000".parse().unwrap();
//! assert_eq!(id, parsed);
//!
//! assert!("not-a-valid-id".parse::<ObjectId>().is_err());
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

////////////////////////////////////////////// Constants ///////////////////////////////////////////////

/// Number of raw bytes in an identifier.
pub const OBJECT_ID_LEN: usize = 12;

/// Number of characters in the canonical hexadecimal encoding.
pub const OBJECT_ID_HEX_LEN: usize = 24;

const COUNTER_MASK: u32 = 0x00FF_FFFF;

static PROCESS_UNIQUE: LazyLock<[u8; 5]> = LazyLock::new(rand::random::<[u8; 5]>);

static COUNTER: LazyLock<AtomicU32> =
    LazyLock::new(|| AtomicU32::new(rand::random::<u32>() & COUNTER_MASK));

////////////////////////////////////////////// ObjectId ////////////////////////////////////////////////

/// A 12-byte, store-assigned document identifier.
///
/// # Examples
///
/// ```
/// # use kitchen::ObjectId;
/// let first = ObjectId::generate();
/// let second = ObjectId::generate();
/// assert_ne!(first, second);
/// assert_eq!(first.to_string().len(), 24);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId([u8; OBJECT_ID_LEN]);

impl ObjectId {
    /// Creates an identifier from its raw bytes.
    pub fn new(bytes: [u8; OBJECT_ID_LEN]) -> Self {
        ObjectId(bytes)
    }

    /// Generates a fresh identifier for the current second.
    ///
    /// Identifiers generated by one process are strictly increasing within a second
    /// and ordered by timestamp across seconds.
    pub fn generate() -> Self {
        let seconds = u32::try_from(Utc::now().timestamp()).unwrap_or_default();
        let count = COUNTER.fetch_add(1, Ordering::SeqCst) & COUNTER_MASK;

        let mut bytes = [0u8; OBJECT_ID_LEN];
        bytes[..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(&*PROCESS_UNIQUE);
        bytes[9..].copy_from_slice(&count.to_be_bytes()[1..]);
        ObjectId(bytes)
    }

    /// Returns a reference to the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; OBJECT_ID_LEN] {
        &self.0
    }

    /// Consumes the identifier and returns the underlying bytes.
    pub fn into_bytes(self) -> [u8; OBJECT_ID_LEN] {
        self.0
    }

    /// The creation time embedded in the identifier, at second precision.
    pub fn timestamp(&self) -> DateTime<Utc> {
        let mut seconds = [0u8; 4];
        seconds.copy_from_slice(&self.0[..4]);
        DateTime::from_timestamp(i64::from(u32::from_be_bytes(seconds)), 0).unwrap_or_default()
    }
}

impl TryFrom<&[u8]> for ObjectId {
    type Error = ObjectIdParseError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; OBJECT_ID_LEN] = bytes
            .try_into()
            .map_err(|_| ObjectIdParseError::InvalidLength)?;
        Ok(ObjectId(bytes))
    }
}

/////////////////////////////////////////////// Codec //////////////////////////////////////////////////

/// Parses the external string form of an identifier.
///
/// This is the only way a path segment becomes an [`ObjectId`]; callers must check the
/// result before touching the store.
pub fn decode(text: &str) -> Result<ObjectId, ObjectIdParseError> {
    text.parse()
}

/// Renders an identifier in its canonical string form.
pub fn encode(id: &ObjectId) -> String {
    id.to_string()
}

/// Errors that can occur when parsing an [`ObjectId`] from a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ObjectIdParseError {
    /// The input is not exactly 24 characters (or 12 bytes) long.
    #[error("identifier must be exactly {OBJECT_ID_HEX_LEN} hexadecimal characters")]
    InvalidLength,
    /// The input contains a character outside `[0-9a-fA-F]`.
    #[error("identifier contains non-hexadecimal characters")]
    InvalidHex,
}

impl Display for ObjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for ObjectId {
    type Err = ObjectIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != OBJECT_ID_HEX_LEN {
            return Err(ObjectIdParseError::InvalidLength);
        }
        let mut bytes = [0u8; OBJECT_ID_LEN];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| ObjectIdParseError::InvalidHex)?;
        Ok(ObjectId(bytes))
    }
}

impl Serialize for ObjectId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D>(deserializer: D) -> Result<ObjectId, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_str(ObjectIdVisitor)
    }
}

struct ObjectIdVisitor;

impl serde::de::Visitor<'_> for ObjectIdVisitor {
    type Value = ObjectId;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a 24-character hexadecimal identifier")
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        value
            .parse()
            .map_err(|e| serde::de::Error::custom(format!("invalid identifier {value:?}: {e}")))
    }
}
