//! Mapeo de errores del cliente Redis a `ConnectionError` del core.
//!
//! La misma clase de error significa cosas distintas según la fase: un
//! fallo de IO al conectar indica semillas inalcanzables; a mitad de
//! ejecución es un fallo de lectura/escritura.

use kv_core::ConnectionError;
use redis::{ErrorKind, RedisError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Connect,
    Command,
}

pub fn map_redis_error(err: &RedisError, phase: Phase) -> ConnectionError {
    let msg = err.to_string();
    match err.kind() {
        ErrorKind::AuthenticationFailed => ConnectionError::Auth(msg),
        ErrorKind::InvalidClientConfig => ConnectionError::Unreachable(msg),
        ErrorKind::ClusterDown
        | ErrorKind::MasterDown
        | ErrorKind::TryAgain
        | ErrorKind::CrossSlot
        | ErrorKind::Moved
        | ErrorKind::Ask => ConnectionError::Topology(msg),
        ErrorKind::IoError if phase == Phase::Connect => ConnectionError::Unreachable(msg),
        ErrorKind::IoError => ConnectionError::Io(msg),
        _ if phase == Phase::Connect => ConnectionError::Topology(msg),
        _ => ConnectionError::Command(msg),
    }
}
