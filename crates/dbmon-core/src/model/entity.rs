// ── Entity identity ──
//
// Rows arrive from the backend (and from callers) as loosely typed JSON:
// ids may be numbers or numeric strings, rows may be bare ids or objects.
// Everything is coerced to `EntityId` at the boundary; anything that does
// not coerce is dropped.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Numeric identifier of a monitored instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(i64);

impl EntityId {
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> i64 {
        self.0
    }

    /// Coerce a JSON value into an id.
    ///
    /// Accepts integers and strings holding an integer (surrounding
    /// whitespace ignored). Floats, booleans, null, arrays and objects
    /// yield `None`.
    pub fn coerce(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_u64().and_then(|u| i64::try_from(u).ok()))
                .map(Self),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntityId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl From<i64> for EntityId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

impl From<EntityId> for i64 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

// ── Entity reference ─────────────────────────────────────────────────

/// Minimal identity plus metadata for one instance.
///
/// Stored references are never patched in place; a refresh replaces the
/// whole list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    /// Every other column the backend sent (db_type, host, port, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EntityRef {
    /// A reference carrying only an id.
    pub fn bare(id: EntityId) -> Self {
        Self {
            id,
            name: String::new(),
            extra: Map::new(),
        }
    }

    /// Build a reference from a backend row or a bare id value.
    pub fn from_value(value: &Value) -> Option<Self> {
        let Value::Object(obj) = value else {
            return EntityId::coerce(value).map(Self::bare);
        };
        let id = obj.get("id").and_then(EntityId::coerce)?;
        let name = obj
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();
        let extra = obj
            .iter()
            .filter(|(k, _)| k.as_str() != "id" && k.as_str() != "name")
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Some(Self { id, name, extra })
    }

    /// Look up an extra column as a string.
    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(Value::as_str)
    }
}

// ── Loosely typed input ──────────────────────────────────────────────

/// Anything a caller may hand to an id-taking action or to
/// `set_available_instances`.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityInput {
    Id(EntityId),
    Entity(EntityRef),
    Raw(Value),
}

impl EntityInput {
    /// Resolve into a full reference, if the input carries a usable id.
    pub fn resolve(self) -> Option<EntityRef> {
        match self {
            Self::Id(id) => Some(EntityRef::bare(id)),
            Self::Entity(entity) => Some(entity),
            Self::Raw(value) => EntityRef::from_value(&value),
        }
    }

    /// The id alone.
    pub fn id(&self) -> Option<EntityId> {
        match self {
            Self::Id(id) => Some(*id),
            Self::Entity(entity) => Some(entity.id),
            Self::Raw(Value::Object(obj)) => obj.get("id").and_then(EntityId::coerce),
            Self::Raw(value) => EntityId::coerce(value),
        }
    }
}

impl From<EntityId> for EntityInput {
    fn from(id: EntityId) -> Self {
        Self::Id(id)
    }
}

impl From<i64> for EntityInput {
    fn from(raw: i64) -> Self {
        Self::Id(EntityId(raw))
    }
}

impl From<EntityRef> for EntityInput {
    fn from(entity: EntityRef) -> Self {
        Self::Entity(entity)
    }
}

impl From<Value> for EntityInput {
    fn from(value: Value) -> Self {
        Self::Raw(value)
    }
}

impl From<&str> for EntityInput {
    fn from(raw: &str) -> Self {
        Self::Raw(Value::String(raw.to_owned()))
    }
}

impl<T: Into<EntityInput>> From<Option<T>> for EntityInput {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Raw(Value::Null), Into::into)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coerce_accepts_integers_and_numeric_strings() {
        assert_eq!(EntityId::coerce(&json!(7)), Some(EntityId(7)));
        assert_eq!(EntityId::coerce(&json!(" 12 ")), Some(EntityId(12)));
        assert_eq!(EntityId::coerce(&json!("-3")), Some(EntityId(-3)));
    }

    #[test]
    fn coerce_rejects_everything_else() {
        for value in [
            json!(null),
            json!(true),
            json!(1.5),
            json!("abc"),
            json!(""),
            json!([1]),
            json!({}),
        ] {
            assert_eq!(EntityId::coerce(&value), None, "{value}");
        }
    }

    #[test]
    fn entity_ref_keeps_extra_columns() {
        let entity = EntityRef::from_value(&json!({
            "id": "4",
            "name": "orders-pg",
            "db_type": "postgresql",
            "port": 5432
        }))
        .unwrap();
        assert_eq!(entity.id, EntityId(4));
        assert_eq!(entity.name, "orders-pg");
        assert_eq!(entity.field_str("db_type"), Some("postgresql"));
        assert_eq!(entity.extra.get("port"), Some(&json!(5432)));
        assert!(!entity.extra.contains_key("id"));
    }

    #[test]
    fn object_without_id_is_dropped() {
        assert!(EntityRef::from_value(&json!({ "name": "orphan" })).is_none());
    }

    #[test]
    fn missing_input_has_no_id() {
        let input = EntityInput::from(None::<i64>);
        assert_eq!(input.id(), None);
        assert_eq!(EntityInput::from("9").id(), Some(EntityId(9)));
        assert_eq!(EntityInput::from(json!({ "id": 2 })).id(), Some(EntityId(2)));
    }
}
