//! KvFlow Rust
//!
//! Fachada de los steps fetch/store sobre un cluster clave-valor:
//! - `kv_core`: configuración, schemas, `RowStep` y cluster en memoria.
//! - `kv_redis`: backend Redis cluster y configuración por entorno.

pub use kv_core;
pub use kv_redis;

pub use kv_core::{check_step, ClusterEndpoint, InMemoryCluster, Row, RowSchema, RowStep, StepConfig, StepError,
                  StepMode, StepState};
pub use kv_redis::{ClusterEnv, RedisClusterConnector};
