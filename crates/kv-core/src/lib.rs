//! kv-core: steps fetch/store entre un pipeline de filas y un cluster
//! clave-valor.
//!
//! Módulos:
//! - `config`: `StepConfig`, endpoints semilla y validación.
//! - `model`: tipos declarados, valores, `RowSchema` y `Row`.
//! - `resolver`: schema de salida (append vs. overwrite del campo valor).
//! - `connection`: contrato con el backend y `ClusterConnection` (recurso
//!   exclusivo del step); incluye un cluster en memoria.
//! - `step`: máquina de estados `RowStep` y transporte de filas.
//! - `check`: verificación de diseño.
pub mod check;
pub mod config;
pub mod connection;
pub mod errors;
pub mod model;
pub mod resolver;
pub mod step;

pub use check::{check_step, CheckRemark, RemarkKind};
pub use config::{parse_endpoints, ClusterEndpoint, EndpointSet, StepConfig, StepMode, MAX_EXPIRATION_SECONDS};
pub use connection::{ClusterConnection, ClusterConnector, ConnectionState, InMemoryCluster, KvSession};
pub use errors::{ConfigError, ConnectionError, FieldRole, StepError};
pub use model::{FieldMeta, FieldValue, Row, RowSchema, ValueType};
pub use resolver::{ResolvedSchema, RowSchemaResolver, ValueSlot};
pub use step::{RowSink, RowSource, RowStep, StepCounters, StepState, StopSignal, VecRowSink, VecRowSource};
