//! Configuración de un step: campos clave/valor, tipo declarado (fetch),
//! expiración (store) y endpoints semilla del cluster.
//!
//! La persistencia la hace un serializador externo; aquí sólo se fija la
//! forma serde (`keyfield`, `valuefield`, `valuetype`, `expiration`,
//! `servers: [{hostname, port}]`) y la validación.

use std::fmt;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::model::ValueType;

/// Par host/puerto usado como semilla de descubrimiento.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClusterEndpoint {
    #[serde(rename = "hostname")]
    pub host: String,
    pub port: u16,
}

impl ClusterEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { host: host.into(), port }
    }

    /// Parsea `host:port`. Para IPv6 se acepta `[::1]:7000`.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let s = s.trim();
        let (host, port) = s.rsplit_once(':')
                            .ok_or_else(|| ConfigError::InvalidEndpoint(s.to_string()))?;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        let port: u16 = port.parse().map_err(|_| ConfigError::InvalidEndpoint(s.to_string()))?;
        let ep = Self::new(host, port);
        ep.validate()?;
        Ok(ep)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() || self.port == 0 {
            return Err(ConfigError::InvalidEndpoint(self.to_string()));
        }
        Ok(())
    }
}

impl fmt::Display for ClusterEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Expiración máxima aceptada en segundos (entero de 32 bits con signo).
pub const MAX_EXPIRATION_SECONDS: u64 = i32::MAX as u64;

/// Conjunto de endpoints únicos por par. La igualdad ignora el orden.
pub type EndpointSet = IndexSet<ClusterEndpoint>;

/// Parsea una lista separada por comas de `host:port`.
pub fn parse_endpoints(list: &str) -> Result<EndpointSet, ConfigError> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ClusterEndpoint::parse)
        .collect()
}

/// Modo del step: enriquecer filas (GET) o persistir pares (SET).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepMode {
    Fetch,
    Store,
}

impl fmt::Display for StepMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepMode::Fetch => f.write_str("fetch"),
            StepMode::Store => f.write_str("store"),
        }
    }
}

/// Configuración de una instancia de step. Cada copia del step posee la
/// suya (se clona al crear copias).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StepConfig {
    #[serde(rename = "keyfield", default)]
    key_field_name: String,
    #[serde(rename = "valuefield", default)]
    value_field_name: String,
    #[serde(rename = "valuetype", default, skip_serializing_if = "Option::is_none")]
    value_type_name: Option<String>,
    /// Segundos; 0 = sin expiración.
    #[serde(rename = "expiration", default)]
    expiration_seconds: u64,
    #[serde(rename = "servers", default)]
    endpoints: EndpointSet,
}

impl StepConfig {
    /// Configuración de un step fetch.
    pub fn fetch(key_field: impl Into<String>,
                 value_field: impl Into<String>,
                 value_type: impl Into<String>,
                 endpoints: impl IntoIterator<Item = ClusterEndpoint>)
                 -> Self {
        Self { key_field_name: key_field.into(),
               value_field_name: value_field.into(),
               value_type_name: Some(value_type.into()),
               expiration_seconds: 0,
               endpoints: endpoints.into_iter().collect() }
    }

    /// Configuración de un step store.
    pub fn store(key_field: impl Into<String>,
                 value_field: impl Into<String>,
                 expiration_seconds: u64,
                 endpoints: impl IntoIterator<Item = ClusterEndpoint>)
                 -> Self {
        Self { key_field_name: key_field.into(),
               value_field_name: value_field.into(),
               value_type_name: None,
               expiration_seconds,
               endpoints: endpoints.into_iter().collect() }
    }

    pub fn key_field_name(&self) -> &str {
        &self.key_field_name
    }

    pub fn set_key_field_name(&mut self, name: impl Into<String>) {
        self.key_field_name = name.into();
    }

    pub fn value_field_name(&self) -> &str {
        &self.value_field_name
    }

    pub fn set_value_field_name(&mut self, name: impl Into<String>) {
        self.value_field_name = name.into();
    }

    pub fn value_type_name(&self) -> Option<&str> {
        self.value_type_name.as_deref()
    }

    pub fn set_value_type_name(&mut self, name: Option<String>) {
        self.value_type_name = name;
    }

    pub fn expiration_seconds(&self) -> u64 {
        self.expiration_seconds
    }

    pub fn set_expiration_seconds(&mut self, seconds: u64) {
        self.expiration_seconds = seconds;
    }

    pub fn endpoints(&self) -> &EndpointSet {
        &self.endpoints
    }

    pub fn set_endpoints(&mut self, endpoints: EndpointSet) {
        self.endpoints = endpoints;
    }

    /// Agrega un endpoint; devuelve `false` si el par ya existía.
    pub fn add_endpoint(&mut self, endpoint: ClusterEndpoint) -> bool {
        self.endpoints.insert(endpoint)
    }

    /// Tipo declarado del campo valor (sólo fetch).
    pub fn value_type(&self) -> Result<ValueType, ConfigError> {
        match self.value_type_name.as_deref().map(str::trim) {
            None | Some("") => Err(ConfigError::MissingValueType),
            Some(name) => name.parse(),
        }
    }

    /// Valida la configuración para el modo dado.
    ///
    /// Falla si el campo clave o valor está vacío, si no hay endpoints, si
    /// algún endpoint es inválido, si (sólo store) la expiración supera
    /// `MAX_EXPIRATION_SECONDS` o si (sólo fetch) el tipo declarado no se
    /// resuelve a un tipo conocido.
    pub fn validate(&self, mode: StepMode) -> Result<(), ConfigError> {
        if self.key_field_name.trim().is_empty() {
            return Err(ConfigError::EmptyKeyField);
        }
        if self.value_field_name.trim().is_empty() {
            return Err(ConfigError::EmptyValueField);
        }
        if self.endpoints.is_empty() {
            return Err(ConfigError::NoEndpoints);
        }
        for ep in &self.endpoints {
            ep.validate()?;
        }
        match mode {
            StepMode::Fetch => {
                self.value_type()?;
            }
            StepMode::Store if self.expiration_seconds > MAX_EXPIRATION_SECONDS => {
                return Err(ConfigError::InvalidExpiration(self.expiration_seconds));
            }
            StepMode::Store => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn seeds() -> Vec<ClusterEndpoint> {
        vec![ClusterEndpoint::new("10.0.0.1", 7000), ClusterEndpoint::new("10.0.0.2", 7001)]
    }

    #[test]
    fn fetch_config_validates() {
        let cfg = StepConfig::fetch("key", "val", "String", seeds());
        assert_eq!(cfg.validate(StepMode::Fetch), Ok(()));
        assert_eq!(cfg.value_type(), Ok(ValueType::String));
    }

    #[test]
    fn validation_failures() {
        let mut cfg = StepConfig::fetch("", "val", "String", seeds());
        assert_eq!(cfg.validate(StepMode::Fetch), Err(ConfigError::EmptyKeyField));
        cfg.set_key_field_name("key");
        cfg.set_value_field_name("  ");
        assert_eq!(cfg.validate(StepMode::Fetch), Err(ConfigError::EmptyValueField));
        cfg.set_value_field_name("val");
        cfg.set_value_type_name(Some("Varchar".into()));
        assert_eq!(cfg.validate(StepMode::Fetch), Err(ConfigError::UnknownValueType("Varchar".into())));
        cfg.set_value_type_name(None);
        assert_eq!(cfg.validate(StepMode::Fetch), Err(ConfigError::MissingValueType));
        // store no exige tipo declarado
        assert_eq!(cfg.validate(StepMode::Store), Ok(()));
        cfg.set_endpoints(EndpointSet::new());
        assert_eq!(cfg.validate(StepMode::Store), Err(ConfigError::NoEndpoints));
        cfg.add_endpoint(ClusterEndpoint::new("", 7000));
        assert!(matches!(cfg.validate(StepMode::Store), Err(ConfigError::InvalidEndpoint(_))));
    }

    #[test]
    fn expiration_is_bounded_for_store() {
        let mut cfg = StepConfig::store("key", "val", MAX_EXPIRATION_SECONDS, seeds());
        assert_eq!(cfg.validate(StepMode::Store), Ok(()));
        cfg.set_expiration_seconds(MAX_EXPIRATION_SECONDS + 1);
        assert_eq!(cfg.validate(StepMode::Store),
                   Err(ConfigError::InvalidExpiration(MAX_EXPIRATION_SECONDS + 1)));
        cfg.set_expiration_seconds(u64::MAX);
        assert_eq!(cfg.validate(StepMode::Store), Err(ConfigError::InvalidExpiration(u64::MAX)));
        // fetch ignora la expiración
        cfg.set_value_type_name(Some("String".into()));
        assert_eq!(cfg.validate(StepMode::Fetch), Ok(()));
    }

    #[test]
    fn endpoints_are_unique_pairs() {
        let mut cfg = StepConfig::store("key", "val", 0, seeds());
        assert!(!cfg.add_endpoint(ClusterEndpoint::new("10.0.0.1", 7000)));
        assert!(cfg.add_endpoint(ClusterEndpoint::new("10.0.0.1", 7002)));
        assert_eq!(cfg.endpoints().len(), 3);
    }

    #[test]
    fn parse_endpoint_list() {
        let set = parse_endpoints("a:7000, b:7001,,[::1]:7002").unwrap();
        assert_eq!(set.len(), 3);
        assert!(set.contains(&ClusterEndpoint::new("::1", 7002)));
        assert_eq!(ClusterEndpoint::new("::1", 7002).to_string(), "[::1]:7002");
        assert!(parse_endpoints("nohost").is_err());
        assert!(parse_endpoints("h:0").is_err());
    }

    #[test]
    fn serde_round_trip_ignores_order() {
        let cfg = StepConfig::store("key", "val", 30, seeds());
        let v = serde_json::to_value(&cfg).unwrap();
        assert_eq!(v["keyfield"], json!("key"));
        assert_eq!(v["expiration"], json!(30));
        assert!(v.get("valuetype").is_none());
        assert_eq!(v["servers"][0], json!({"hostname": "10.0.0.1", "port": 7000}));

        let reordered = json!({
            "keyfield": "key",
            "valuefield": "val",
            "expiration": 30,
            "servers": [
                {"hostname": "10.0.0.2", "port": 7001},
                {"hostname": "10.0.0.1", "port": 7000},
                {"hostname": "10.0.0.1", "port": 7000}
            ]
        });
        let back: StepConfig = serde_json::from_value(reordered).unwrap();
        assert_eq!(back, cfg);
        assert_eq!(back.endpoints().len(), 2);
    }

    #[test]
    fn negative_expiration_is_rejected_on_load() {
        let bad = json!({"keyfield": "k", "valuefield": "v", "expiration": -1, "servers": []});
        assert!(serde_json::from_value::<StepConfig>(bad).is_err());
    }
}
