//! Errores del core.
//!
//! Taxonomía:
//! - `ConfigError`: configuración inválida, detectada en `init` antes de
//!   procesar cualquier fila.
//! - `ConnectionError`: seeds inalcanzables, fallo de descubrimiento de
//!   topología o fallo de lectura/escritura a mitad de ejecución.
//! - `StepError`: error de un step; envuelve los anteriores y agrega los
//!   errores de resolución de campos.
//!
//! Un miss de clave en fetch NO es un error: se representa como valor nulo.

use std::fmt;

use thiserror::Error;

use crate::step::StepState;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("key field name is empty")]
    EmptyKeyField,
    #[error("value field name is empty")]
    EmptyValueField,
    #[error("no cluster endpoints configured")]
    NoEndpoints,
    #[error("value type name is missing")]
    MissingValueType,
    #[error("unknown value type: {0}")]
    UnknownValueType(String),
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("expiration {0}s exceeds the maximum of {max}s", max = crate::config::MAX_EXPIRATION_SECONDS)]
    InvalidExpiration(u64),
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConnectionError {
    #[error("no seed endpoint reachable: {0}")]
    Unreachable(String),
    #[error("cluster topology discovery failed: {0}")]
    Topology(String),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("io error: {0}")]
    Io(String),
    #[error("command failed: {0}")]
    Command(String),
    #[error("connection is not open")]
    NotConnected,
    #[error("connection cannot be reopened once used")]
    AlreadyUsed,
}

/// Rol de un campo configurado dentro de la fila.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    Key,
    Value,
}

impl fmt::Display for FieldRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldRole::Key => f.write_str("key"),
            FieldRole::Value => f.write_str("value"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum StepError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("connection error: {0}")]
    Connection(#[from] ConnectionError),
    #[error("{role} field '{field}' not found in input row schema")]
    FieldNotFound { field: String, role: FieldRole },
    #[error("{role} field '{field}' is null")]
    NullField { field: String, role: FieldRole },
    #[error("operation not allowed in state {0:?}")]
    InvalidState(StepState),
}

impl StepError {
    /// Todos los errores de step abortan el carril del step; este helper
    /// sólo distingue los que vienen del cluster para logging.
    pub fn is_connection(&self) -> bool {
        matches!(self, StepError::Connection(_))
    }
}
