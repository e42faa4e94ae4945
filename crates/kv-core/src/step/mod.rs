//! Steps fetch/store sobre un transporte de filas.
//!
//! - `RowStep`: máquina de estados única, parametrizada por `StepMode`.
//! - `StepState`: estados del ciclo de vida.
//! - `RowSource` / `RowSink`: contratos con el transporte del anfitrión.
//! - `StopSignal`: parada cooperativa entre filas.

mod runner;
mod state;
mod transport;

pub use runner::{RowStep, StepCounters, DEFAULT_FEEDBACK_INTERVAL};
pub use state::StepState;
pub use transport::{RowSink, RowSource, StopSignal, VecRowSink, VecRowSource};
