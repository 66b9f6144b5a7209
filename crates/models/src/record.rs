use std::{cmp::Ordering, fmt, str::FromStr};

use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};

use crate::errors::ModelError;

/// The two managed record sets. The string form is the store's table name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Projects,
    Services,
}

impl Collection {
    pub const ALL: [Collection; 2] = [Collection::Projects, Collection::Services];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Projects => "projects",
            Collection::Services => "services",
        }
    }

    /// Human label used in headings, e.g. "Projects".
    pub fn label(&self) -> &'static str {
        match self {
            Collection::Projects => "Projects",
            Collection::Services => "Services",
        }
    }

    /// Singular label used in buttons and prompts, e.g. "project".
    pub fn singular(&self) -> &'static str {
        match self {
            Collection::Projects => "project",
            Collection::Services => "service",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collection {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "projects" => Ok(Collection::Projects),
            "services" => Ok(Collection::Services),
            other => Err(ModelError::UnknownCollection(other.to_string())),
        }
    }
}

/// Server-assigned record id. Stores hand out integers or UUIDs; the console
/// only ever compares and echoes them, so both are kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Text(String),
        }
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Int(n) => RecordId(n.to_string()),
            Raw::Text(s) => RecordId(s),
        })
    }
}

/// Display position within a collection.
///
/// `None` is the not-a-number value produced by unparseable input; it is
/// sent to the store as JSON `null` and sorts after every number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderIndex(Option<i64>);

impl Default for OrderIndex {
    fn default() -> Self {
        OrderIndex(Some(0))
    }
}

impl OrderIndex {
    pub const NAN: OrderIndex = OrderIndex(None);

    pub fn new(n: i64) -> Self {
        OrderIndex(Some(n))
    }

    pub fn value(&self) -> Option<i64> {
        self.0
    }

    pub fn is_nan(&self) -> bool {
        self.0.is_none()
    }

    /// Integer-prefix parse of a form input: leading whitespace is skipped,
    /// an optional sign and the leading decimal digits are read, anything
    /// after them is ignored. No digits (or an out-of-range value) gives NaN.
    ///
    /// ```
    /// use models::OrderIndex;
    /// assert_eq!(OrderIndex::parse_input(" 12abc").value(), Some(12));
    /// assert_eq!(OrderIndex::parse_input("-3").value(), Some(-3));
    /// assert!(OrderIndex::parse_input("abc").is_nan());
    /// ```
    pub fn parse_input(raw: &str) -> Self {
        let s = raw.trim_start();
        let (negative, rest) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };
        let digits_len = rest.bytes().take_while(|b| b.is_ascii_digit()).count();
        if digits_len == 0 {
            return OrderIndex::NAN;
        }
        let digits = &rest[..digits_len];
        let parsed = if negative {
            format!("-{digits}").parse::<i64>()
        } else {
            digits.parse::<i64>()
        };
        parsed.map(|n| OrderIndex(Some(n))).unwrap_or(OrderIndex::NAN)
    }

    /// Value used to seed a draft from a stored record: a stored `null`
    /// starts the draft at 0.
    pub fn seeded(self) -> Self {
        OrderIndex(Some(self.0.unwrap_or(0)))
    }

    /// Text for a number input; NaN renders empty.
    pub fn to_input_value(&self) -> String {
        self.0.map(|n| n.to_string()).unwrap_or_default()
    }

    /// Ascending with NaN last.
    pub fn display_cmp(&self, other: &Self) -> Ordering {
        match (self.0, other.0) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

/// Editable copy of a record. Serialises to the full save payload.
pub trait Draft: Clone + Default + Send + Sync + Serialize + 'static {
    /// Required-field check performed before any store call.
    fn validate(&self) -> Result<(), ModelError>;
}

/// A row of one of the managed collections.
pub trait Record: Clone + Send + Sync + DeserializeOwned + 'static {
    const COLLECTION: Collection;
    type Draft: Draft;

    fn id(&self) -> &RecordId;
    fn title(&self) -> &str;
    fn order_index(&self) -> OrderIndex;
    /// Draft seeded from this record for edit mode.
    fn to_draft(&self) -> Self::Draft;
}

/// Treat a stored `null` text column as the empty string.
pub(crate) fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Stable ascending sort by `order_index`; equal positions keep the order
/// in which the store returned them.
pub fn sort_for_display<T: Record>(records: &mut [T]) {
    records.sort_by(|a, b| a.order_index().display_cmp(&b.order_index()));
}
