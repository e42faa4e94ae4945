//! Backend Redis cluster.
//!
//! El cliente descubre la topología a partir de las semillas; aquí sólo se
//! arma la lista de nodos, se abre la conexión y se traducen GET/SET.

use kv_core::{ClusterConnector, ClusterEndpoint, ConnectionError, EndpointSet, KvSession};
use log::debug;
use redis::cluster::{ClusterClientBuilder, ClusterConnection};

use crate::error::{map_redis_error, Phase};

/// URL de conexión de una semilla.
pub fn node_url(endpoint: &ClusterEndpoint) -> String {
    format!("redis://{endpoint}/")
}

/// Proveedor de sesiones Redis cluster. Cada `connect` crea un cliente y
/// una conexión propios (sin pool compartido entre copias de step).
#[derive(Debug, Clone, Default)]
pub struct RedisClusterConnector {
    username: Option<String>,
    password: Option<String>,
}

impl RedisClusterConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(mut self, username: Option<String>, password: Option<String>) -> Self {
        self.username = username;
        self.password = password;
        self
    }
}

impl ClusterConnector for RedisClusterConnector {
    fn connect(&self, endpoints: &EndpointSet) -> Result<Box<dyn KvSession>, ConnectionError> {
        let nodes: Vec<String> = endpoints.iter().map(node_url).collect();
        debug!("redis connect:start nodes={}", nodes.join(","));
        let mut builder = ClusterClientBuilder::new(nodes);
        if let Some(user) = &self.username {
            builder = builder.username(user.clone());
        }
        if let Some(pass) = &self.password {
            builder = builder.password(pass.clone());
        }
        let client = builder.build().map_err(|e| map_redis_error(&e, Phase::Connect))?;
        let conn = client.get_connection().map_err(|e| map_redis_error(&e, Phase::Connect))?;
        debug!("redis connect:done");
        Ok(Box::new(RedisSession { conn }))
    }
}

struct RedisSession {
    conn: ClusterConnection,
}

impl KvSession for RedisSession {
    fn get(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>, ConnectionError> {
        redis::cmd("GET").arg(key)
                         .query::<Option<Vec<u8>>>(&mut self.conn)
                         .map_err(|e| map_redis_error(&e, Phase::Command))
    }

    fn set(&mut self, key: &[u8], value: &[u8], ttl_seconds: Option<u64>) -> Result<(), ConnectionError> {
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        // EX en el mismo SET: escritura y expiración atómicas
        if let Some(ttl) = ttl_seconds {
            cmd.arg("EX").arg(ttl);
        }
        cmd.query::<()>(&mut self.conn).map_err(|e| map_redis_error(&e, Phase::Command))
    }

    fn close(&mut self) {
        debug!("redis close");
    }
}
