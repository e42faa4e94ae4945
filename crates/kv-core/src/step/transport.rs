//! Contratos con el transporte de filas del pipeline anfitrión.
//!
//! El orden y la contrapresión son responsabilidad del anfitrión; el step
//! toma una fila y emite cero o una fila por llamada.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::model::{Row, RowSchema};

/// Origen de filas.
pub trait RowSource {
    /// Schema de las filas de entrada.
    fn schema(&self) -> &RowSchema;
    /// Siguiente fila; `None` cuando no hay más entrada.
    fn next_row(&mut self) -> Option<Row>;
}

/// Destino de filas.
pub trait RowSink {
    fn put_row(&mut self, schema: &Arc<RowSchema>, row: Row);
    /// Señal de fin de salida (una sola vez por ejecución).
    fn set_output_done(&mut self);
}

/// Señal de parada compartida con el anfitrión. Se consulta al inicio de
/// cada `process_row`.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Origen en memoria.
#[derive(Debug, Clone)]
pub struct VecRowSource {
    schema: RowSchema,
    rows: VecDeque<Row>,
}

impl VecRowSource {
    pub fn new(schema: RowSchema, rows: impl IntoIterator<Item = Row>) -> Self {
        Self { schema, rows: rows.into_iter().collect() }
    }

    pub fn remaining(&self) -> usize {
        self.rows.len()
    }
}

impl RowSource for VecRowSource {
    fn schema(&self) -> &RowSchema {
        &self.schema
    }

    fn next_row(&mut self) -> Option<Row> {
        self.rows.pop_front()
    }
}

/// Destino en memoria: acumula filas y el schema con que se emitieron.
#[derive(Debug, Default)]
pub struct VecRowSink {
    pub schema: Option<Arc<RowSchema>>,
    pub rows: Vec<Row>,
    pub done_signals: usize,
}

impl VecRowSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_done(&self) -> bool {
        self.done_signals > 0
    }
}

impl RowSink for VecRowSink {
    fn put_row(&mut self, schema: &Arc<RowSchema>, row: Row) {
        if self.schema.is_none() {
            self.schema = Some(Arc::clone(schema));
        }
        self.rows.push(row);
    }

    fn set_output_done(&mut self) {
        self.done_signals += 1;
    }
}
