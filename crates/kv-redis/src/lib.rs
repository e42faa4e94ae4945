//! kv-redis: backend Redis cluster para los steps de kv-core.
//! - `cluster`: `RedisClusterConnector` (implementa `ClusterConnector`).
//! - `config`: semillas y credenciales desde el entorno.
//! - `error`: traducción de errores del cliente.
pub mod cluster;
pub mod config;
pub mod error;

pub use cluster::{node_url, RedisClusterConnector};
pub use config::{init_dotenv, ClusterEnv};
pub use error::{map_redis_error, Phase};
