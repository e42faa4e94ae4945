//! Backend en memoria del cluster, para tests y ejecución local.
//!
//! Todas las sesiones abiertas desde un mismo `InMemoryCluster` comparten los
//! datos. La expiración usa un reloj lógico en segundos que sólo avanza con
//! `advance_secs`, de modo que el comportamiento de TTL es determinista.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use super::{ClusterConnector, KvSession};
use crate::config::{ClusterEndpoint, EndpointSet};
use crate::errors::ConnectionError;

#[derive(Debug, Clone)]
struct Entry {
    value: Vec<u8>,
    expires_at: Option<u64>,
}

#[derive(Debug, Default)]
struct ClusterState {
    /// Nodos alcanzables; vacío = acepta cualquier semilla.
    nodes: EndpointSet,
    entries: DashMap<Vec<u8>, Entry>,
    clock_secs: AtomicU64,
    connects: AtomicUsize,
    open_sessions: AtomicUsize,
    failing: AtomicBool,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryCluster {
    inner: Arc<ClusterState>,
}

impl InMemoryCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cluster que sólo acepta las semillas indicadas.
    pub fn with_nodes(nodes: impl IntoIterator<Item = ClusterEndpoint>) -> Self {
        Self { inner: Arc::new(ClusterState { nodes: nodes.into_iter().collect(),
                                              ..ClusterState::default() }) }
    }

    /// Escritura fuera de banda (sin pasar por un step).
    pub fn insert(&self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) {
        self.inner.entries.insert(key.as_ref().to_vec(),
                                  Entry { value: value.as_ref().to_vec(), expires_at: None });
    }

    /// Lectura fuera de banda; respeta la expiración.
    pub fn get_raw(&self, key: impl AsRef<[u8]>) -> Option<Vec<u8>> {
        self.inner.read(key.as_ref())
    }

    /// TTL restante en segundos, si la clave tiene expiración.
    pub fn ttl_of(&self, key: impl AsRef<[u8]>) -> Option<u64> {
        let now = self.inner.now();
        self.inner
            .entries
            .get(key.as_ref())
            .and_then(|e| e.expires_at)
            .map(|at| at.saturating_sub(now))
    }

    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    pub fn advance_secs(&self, secs: u64) {
        self.inner.clock_secs.fetch_add(secs, Ordering::SeqCst);
    }

    /// Simula una caída: las llamadas GET/SET fallan con error de IO.
    pub fn set_failing(&self, failing: bool) {
        self.inner.failing.store(failing, Ordering::SeqCst);
    }

    pub fn connect_count(&self) -> usize {
        self.inner.connects.load(Ordering::SeqCst)
    }

    pub fn open_sessions(&self) -> usize {
        self.inner.open_sessions.load(Ordering::SeqCst)
    }
}

impl ClusterState {
    fn now(&self) -> u64 {
        self.clock_secs.load(Ordering::SeqCst)
    }

    fn read(&self, key: &[u8]) -> Option<Vec<u8>> {
        let now = self.now();
        let expired = match self.entries.get(key) {
            None => return None,
            Some(e) => match e.expires_at {
                Some(at) if at <= now => true,
                _ => return Some(e.value.clone()),
            },
        };
        if expired {
            self.entries.remove(key);
        }
        None
    }

    fn check_failing(&self) -> Result<(), ConnectionError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ConnectionError::Io("connection reset by peer".into()));
        }
        Ok(())
    }
}

impl ClusterConnector for InMemoryCluster {
    fn connect(&self, endpoints: &EndpointSet) -> Result<Box<dyn KvSession>, ConnectionError> {
        let reachable = self.inner.nodes.is_empty() || endpoints.iter().any(|e| self.inner.nodes.contains(e));
        if !reachable {
            let seeds: Vec<String> = endpoints.iter().map(|e| e.to_string()).collect();
            return Err(ConnectionError::Unreachable(seeds.join(",")));
        }
        self.inner.connects.fetch_add(1, Ordering::SeqCst);
        self.inner.open_sessions.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(InMemorySession { state: Arc::clone(&self.inner), open: true }))
    }
}

struct InMemorySession {
    state: Arc<ClusterState>,
    open: bool,
}

impl KvSession for InMemorySession {
    fn get(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>, ConnectionError> {
        self.state.check_failing()?;
        Ok(self.state.read(key))
    }

    fn set(&mut self, key: &[u8], value: &[u8], ttl_seconds: Option<u64>) -> Result<(), ConnectionError> {
        self.state.check_failing()?;
        let expires_at = ttl_seconds.map(|ttl| self.state.now().saturating_add(ttl));
        self.state.entries.insert(key.to_vec(), Entry { value: value.to_vec(), expires_at });
        Ok(())
    }

    fn close(&mut self) {
        if self.open {
            self.open = false;
            self.state.open_sessions.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl Drop for InMemorySession {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeds(port: u16) -> EndpointSet {
        [ClusterEndpoint::new("127.0.0.1", port)].into_iter().collect()
    }

    #[test]
    fn unknown_seeds_are_unreachable() {
        let cluster = InMemoryCluster::with_nodes([ClusterEndpoint::new("127.0.0.1", 7000)]);
        assert!(matches!(cluster.connect(&seeds(7999)), Err(ConnectionError::Unreachable(_))));
        assert!(cluster.connect(&seeds(7000)).is_ok());
        assert_eq!(cluster.connect_count(), 1);
    }

    #[test]
    fn ttl_expires_on_logical_clock() {
        let cluster = InMemoryCluster::new();
        let mut s = cluster.connect(&seeds(7000)).unwrap();
        s.set(b"a", b"1", Some(10)).unwrap();
        s.set(b"b", b"2", None).unwrap();
        assert_eq!(cluster.ttl_of("a"), Some(10));
        cluster.advance_secs(9);
        assert_eq!(s.get(b"a").unwrap(), Some(b"1".to_vec()));
        cluster.advance_secs(1);
        assert_eq!(s.get(b"a").unwrap(), None);
        cluster.advance_secs(1_000_000);
        assert_eq!(s.get(b"b").unwrap(), Some(b"2".to_vec()));
        assert_eq!(cluster.len(), 1);
    }

    #[test]
    fn huge_ttl_saturates_instead_of_overflowing() {
        let cluster = InMemoryCluster::new();
        cluster.advance_secs(1);
        let mut s = cluster.connect(&seeds(7000)).unwrap();
        s.set(b"a", b"1", Some(u64::MAX)).unwrap();
        cluster.advance_secs(1_000_000);
        assert_eq!(s.get(b"a").unwrap(), Some(b"1".to_vec()));
    }

    #[test]
    fn failing_cluster_reports_io() {
        let cluster = InMemoryCluster::new();
        let mut s = cluster.connect(&seeds(7000)).unwrap();
        cluster.set_failing(true);
        assert!(matches!(s.get(b"a"), Err(ConnectionError::Io(_))));
        assert!(matches!(s.set(b"a", b"1", None), Err(ConnectionError::Io(_))));
        s.close();
        drop(s);
        assert_eq!(cluster.open_sessions(), 0);
    }
}
