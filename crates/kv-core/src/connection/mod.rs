//! Conexión al cluster clave-valor.
//!
//! El backend concreto (Redis cluster, memoria) se inyecta vía
//! `ClusterConnector`, que abre una `KvSession` a partir de los endpoints
//! semilla; el descubrimiento de topología es responsabilidad del backend.
//!
//! `ClusterConnection` es el recurso que posee un step: se abre una sola
//! vez, nunca se reabre, y se cierra exactamente una vez (explícitamente o
//! al hacer drop).

pub mod memory;

use log::debug;

use crate::config::EndpointSet;
use crate::errors::ConnectionError;
use crate::model::FieldValue;

pub use memory::InMemoryCluster;

/// Sesión abierta contra el cluster. Llamadas síncronas, sin pipelining.
pub trait KvSession: Send {
    /// GET. `Ok(None)` cuando la clave no existe (o expiró).
    fn get(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>, ConnectionError>;

    /// SET. Con `ttl_seconds = Some(n)` la expiración se aplica en la misma
    /// escritura.
    fn set(&mut self, key: &[u8], value: &[u8], ttl_seconds: Option<u64>) -> Result<(), ConnectionError>;

    /// Libera recursos del backend. Se llama una sola vez.
    fn close(&mut self) {}
}

/// Proveedor de sesiones (permite testear sin un cluster real).
pub trait ClusterConnector {
    fn connect(&self, endpoints: &EndpointSet) -> Result<Box<dyn KvSession>, ConnectionError>;
}

impl<C: ClusterConnector + ?Sized> ClusterConnector for &C {
    fn connect(&self, endpoints: &EndpointSet) -> Result<Box<dyn KvSession>, ConnectionError> {
        (**self).connect(endpoints)
    }
}

/// Estado del ciclo de vida de la conexión.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Open,
    Closed,
}

pub struct ClusterConnection {
    endpoints: EndpointSet,
    session: Option<Box<dyn KvSession>>,
    state: ConnectionState,
}

impl ClusterConnection {
    pub fn new(endpoints: EndpointSet) -> Self {
        Self { endpoints, session: None, state: ConnectionState::Idle }
    }

    /// Abre la sesión. Sólo se permite desde `Idle`.
    pub fn connect<C: ClusterConnector + ?Sized>(&mut self, connector: &C) -> Result<(), ConnectionError> {
        if self.state != ConnectionState::Idle {
            return Err(ConnectionError::AlreadyUsed);
        }
        if self.endpoints.is_empty() {
            return Err(ConnectionError::Unreachable("no seed endpoints".into()));
        }
        debug!("connect:start seeds={}", self.seeds_label());
        let session = connector.connect(&self.endpoints)?;
        self.session = Some(session);
        self.state = ConnectionState::Open;
        debug!("connect:done seeds={}", self.seeds_label());
        Ok(())
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    pub fn endpoints(&self) -> &EndpointSet {
        &self.endpoints
    }

    fn session(&mut self) -> Result<&mut Box<dyn KvSession>, ConnectionError> {
        self.session.as_mut().ok_or(ConnectionError::NotConnected)
    }

    /// GET; el valor se entrega sin conversión (texto o binario).
    pub fn get(&mut self, key: &[u8]) -> Result<Option<FieldValue>, ConnectionError> {
        let raw = self.session()?.get(key)?;
        Ok(raw.map(FieldValue::from_store_bytes))
    }

    /// SET; `ttl_seconds == 0` persiste sin expiración.
    pub fn set(&mut self, key: &[u8], value: &[u8], ttl_seconds: u64) -> Result<(), ConnectionError> {
        let ttl = (ttl_seconds > 0).then_some(ttl_seconds);
        self.session()?.set(key, value, ttl)
    }

    /// Cierra la sesión. Idempotente: sólo la primera llamada libera.
    pub fn close(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.close();
            debug!("close:done seeds={}", self.seeds_label());
        }
        if self.state == ConnectionState::Idle {
            debug!("close:never_opened seeds={}", self.seeds_label());
        }
        self.state = ConnectionState::Closed;
    }

    fn seeds_label(&self) -> String {
        self.endpoints.iter().map(|e| e.to_string()).collect::<Vec<_>>().join(",")
    }
}

impl Drop for ClusterConnection {
    fn drop(&mut self) {
        if self.state != ConnectionState::Closed {
            self.close();
        }
    }
}

impl std::fmt::Debug for ClusterConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterConnection")
         .field("endpoints", &self.endpoints)
         .field("state", &self.state)
         .finish()
    }
}
