//! Materialized result rows.

use crate::connection::RawRow;
use crate::error::{RelqError, RelqResult};
use crate::value::{FromValue, Value};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// One result row: named attributes in column order.
///
/// A record owns its values and keeps no link to the query that produced it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new(fields: RawRow) -> Self {
        Self { fields }
    }

    /// Look up an attribute by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value)
    }

    /// Look up an attribute, failing with [`RelqError::Decode`] if the row has
    /// no such column.
    pub fn get_attribute(&self, name: &str) -> RelqResult<&Value> {
        self.get(name)
            .ok_or_else(|| RelqError::decode(name, "column not found in row"))
    }

    /// Typed access to an attribute.
    ///
    /// ```ignore
    /// let id: i64 = record.try_get("id")?;
    /// let email: Option<String> = record.try_get("email")?;
    /// ```
    pub fn try_get<T: FromValue>(&self, name: &str) -> RelqResult<T> {
        T::from_value(self.get_attribute(name)?, name)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(column, _)| column.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.fields.iter().map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_inner(self) -> RawRow {
        self.fields
    }
}

impl From<RawRow> for Record {
    fn from(fields: RawRow) -> Self {
        Self::new(fields)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (column, value) in &self.fields {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> Record {
        Record::new(vec![
            ("id".to_string(), Value::Int(1)),
            ("email".to_string(), Value::Null),
            ("name".to_string(), Value::from("ada")),
        ])
    }

    #[test]
    fn typed_access() {
        let r = row();
        assert_eq!(r.try_get::<i64>("id").unwrap(), 1);
        assert_eq!(r.try_get::<Option<String>>("email").unwrap(), None);
        assert!(r.try_get::<String>("missing").is_err());
        assert_eq!(r.columns().collect::<Vec<_>>(), vec!["id", "email", "name"]);
    }

    #[test]
    fn serializes_in_column_order() {
        let json = serde_json::to_string(&row()).unwrap();
        assert_eq!(json, r#"{"id":1,"email":null,"name":"ada"}"#);
    }
}
