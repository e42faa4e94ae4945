//! Configuración del cluster desde variables de entorno.
//! `KV_CLUSTER_NODES` lista las semillas (`host:port,host:port`); usuario y
//! contraseña son opcionales.

use std::env;

use dotenvy::dotenv;
use kv_core::{parse_endpoints, ConfigError, EndpointSet};
use once_cell::sync::Lazy;

use crate::cluster::RedisClusterConnector;

pub const NODES_VAR: &str = "KV_CLUSTER_NODES";
pub const USERNAME_VAR: &str = "KV_CLUSTER_USERNAME";
pub const PASSWORD_VAR: &str = "KV_CLUSTER_PASSWORD";

// .env se carga una sola vez
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv();
});

#[derive(Debug, Clone)]
pub struct ClusterEnv {
    pub endpoints: EndpointSet,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ClusterEnv {
    pub fn from_env() -> Result<Self, ConfigError> {
        Lazy::force(&DOTENV_LOADED);
        let raw = env::var(NODES_VAR).map_err(|_| ConfigError::NoEndpoints)?;
        let endpoints = parse_endpoints(&raw)?;
        if endpoints.is_empty() {
            return Err(ConfigError::NoEndpoints);
        }
        let username = env::var(USERNAME_VAR).ok().filter(|v| !v.is_empty());
        let password = env::var(PASSWORD_VAR).ok().filter(|v| !v.is_empty());
        Ok(Self { endpoints, username, password })
    }

    pub fn connector(&self) -> RedisClusterConnector {
        RedisClusterConnector::new().with_credentials(self.username.clone(), self.password.clone())
    }
}

/// Forzar carga temprana de .env desde binarios.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}
