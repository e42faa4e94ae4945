//! Tipos de valor declarados (metadata de schema) y valores de campo.
//!
//! El tipo declarado es sólo metadata: nunca dispara conversión de los bytes
//! leídos del cluster.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::errors::ConfigError;

/// Tabla clásica de tipos de metadata de fila.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    None,
    Number,
    String,
    Date,
    Boolean,
    Integer,
    BigNumber,
    Serializable,
    Binary,
    Timestamp,
    #[serde(rename = "Internet Address")]
    InetAddress,
}

const TYPE_NAMES: [(ValueType, &str); 11] = [(ValueType::None, "None"),
                                              (ValueType::Number, "Number"),
                                              (ValueType::String, "String"),
                                              (ValueType::Date, "Date"),
                                              (ValueType::Boolean, "Boolean"),
                                              (ValueType::Integer, "Integer"),
                                              (ValueType::BigNumber, "BigNumber"),
                                              (ValueType::Serializable, "Serializable"),
                                              (ValueType::Binary, "Binary"),
                                              (ValueType::Timestamp, "Timestamp"),
                                              (ValueType::InetAddress, "Internet Address")];

impl ValueType {
    pub fn name(&self) -> &'static str {
        TYPE_NAMES.iter()
                  .find(|(t, _)| t == self)
                  .map(|(_, n)| *n)
                  .unwrap_or("None")
    }

    /// Busca el tipo por nombre, sin distinguir mayúsculas.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        TYPE_NAMES.iter()
                  .find(|(_, n)| n.eq_ignore_ascii_case(name))
                  .map(|(t, _)| *t)
    }

    /// Nombres seleccionables para un campo (excluye `None`).
    pub fn selectable_names() -> impl Iterator<Item = &'static str> {
        TYPE_NAMES.iter().filter(|(t, _)| *t != ValueType::None).map(|(_, n)| *n)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ValueType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match ValueType::from_name(s) {
            Some(ValueType::None) | None => Err(ConfigError::UnknownValueType(s.to_string())),
            Some(t) => Ok(t),
        }
    }
}

/// Valor de un campo de fila.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    String(String),
    Integer(i64),
    Number(f64),
    Boolean(bool),
    Date(DateTime<Utc>),
    Binary(Vec<u8>),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Representación nativa del store (bytes). `None` para nulos, que el
    /// store no puede representar.
    pub fn to_store_bytes(&self) -> Option<Vec<u8>> {
        match self {
            FieldValue::Null => None,
            FieldValue::String(s) => Some(s.as_bytes().to_vec()),
            FieldValue::Integer(i) => Some(i.to_string().into_bytes()),
            FieldValue::Number(n) => Some(n.to_string().into_bytes()),
            FieldValue::Boolean(b) => Some(b.to_string().into_bytes()),
            FieldValue::Date(d) => Some(d.to_rfc3339_opts(SecondsFormat::Millis, true).into_bytes()),
            FieldValue::Binary(b) => Some(b.clone()),
        }
    }

    /// Valor leído del store. Se entrega tal cual: texto si es UTF-8 válido,
    /// binario en otro caso.
    pub fn from_store_bytes(bytes: Vec<u8>) -> Self {
        match String::from_utf8(bytes) {
            Ok(s) => FieldValue::String(s),
            Err(e) => FieldValue::Binary(e.into_bytes()),
        }
    }

    /// Conversión desde JSON sin información de tipo.
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => FieldValue::Null,
            JsonValue::Bool(b) => FieldValue::Boolean(*b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Integer(i),
                None => FieldValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::String(s) => FieldValue::String(s.clone()),
            other => FieldValue::String(other.to_string()),
        }
    }

    /// Conversión desde JSON guiada por el tipo declarado del campo. Si el
    /// valor no encaja con el tipo se conserva la lectura sin tipo.
    pub fn from_json_typed(value: &JsonValue, value_type: ValueType) -> Self {
        match (value_type, value) {
            (ValueType::Date | ValueType::Timestamp, JsonValue::String(s)) => DateTime::parse_from_rfc3339(s)
                .map(|d| FieldValue::Date(d.with_timezone(&Utc)))
                .unwrap_or_else(|_| FieldValue::String(s.clone())),
            (ValueType::Number | ValueType::BigNumber, JsonValue::Number(n)) => {
                FieldValue::Number(n.as_f64().unwrap_or(f64::NAN))
            }
            (ValueType::Binary, JsonValue::Array(items)) => {
                let bytes: Option<Vec<u8>> = items.iter()
                                                  .map(|i| i.as_u64().and_then(|b| u8::try_from(b).ok()))
                                                  .collect();
                bytes.map(FieldValue::Binary).unwrap_or_else(|| FieldValue::from_json(value))
            }
            _ => FieldValue::from_json(value),
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            FieldValue::Null => JsonValue::Null,
            FieldValue::String(s) => JsonValue::String(s.clone()),
            FieldValue::Integer(i) => JsonValue::from(*i),
            FieldValue::Number(n) => JsonValue::from(*n),
            FieldValue::Boolean(b) => JsonValue::Bool(*b),
            FieldValue::Date(d) => JsonValue::String(d.to_rfc3339_opts(SecondsFormat::Millis, true)),
            FieldValue::Binary(b) => JsonValue::Array(b.iter().map(|x| JsonValue::from(*x)).collect()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Integer(i)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Boolean(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn type_names_are_case_insensitive() {
        assert_eq!(ValueType::from_name("string"), Some(ValueType::String));
        assert_eq!(ValueType::from_name("Internet Address"), Some(ValueType::InetAddress));
        assert_eq!("bignumber".parse::<ValueType>(), Ok(ValueType::BigNumber));
        assert_eq!("Varchar".parse::<ValueType>(), Err(ConfigError::UnknownValueType("Varchar".into())));
        // None existe en la tabla pero no es seleccionable como tipo de campo
        assert!("None".parse::<ValueType>().is_err());
        assert_eq!(ValueType::selectable_names().count(), 10);
    }

    #[test]
    fn store_bytes_native_representation() {
        assert_eq!(FieldValue::from("Alice").to_store_bytes(), Some(b"Alice".to_vec()));
        assert_eq!(FieldValue::Integer(42).to_store_bytes(), Some(b"42".to_vec()));
        assert_eq!(FieldValue::Boolean(true).to_store_bytes(), Some(b"true".to_vec()));
        assert_eq!(FieldValue::Null.to_store_bytes(), None);
    }

    #[test]
    fn fetched_bytes_are_not_coerced() {
        assert_eq!(FieldValue::from_store_bytes(b"42".to_vec()), FieldValue::String("42".into()));
        assert_eq!(FieldValue::from_store_bytes(vec![0xff, 0x00]), FieldValue::Binary(vec![0xff, 0x00]));
    }

    #[test]
    fn typed_json_reads_dates() {
        let v = FieldValue::from_json_typed(&json!("2024-01-02T03:04:05Z"), ValueType::Date);
        assert!(matches!(v, FieldValue::Date(_)));
        assert_eq!(v.to_json(), json!("2024-01-02T03:04:05.000Z"));
        let v = FieldValue::from_json_typed(&json!("not a date"), ValueType::Date);
        assert_eq!(v, FieldValue::String("not a date".into()));
        assert_eq!(FieldValue::from_json_typed(&json!(3), ValueType::Number), FieldValue::Number(3.0));
        assert_eq!(FieldValue::from_json(&json!(3)), FieldValue::Integer(3));
    }
}
