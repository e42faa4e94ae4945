//! `RowStep`: máquina de estados compartida por los modos fetch y store.
//!
//! El ciclo de vida (init, conexión, fin, fallo, cierre) es único; sólo el
//! cuerpo por fila difiere según `StepMode`.

use std::sync::Arc;

use log::{debug, error, info};
use uuid::Uuid;

use super::state::StepState;
use super::transport::{RowSink, RowSource, StopSignal};
use crate::config::{StepConfig, StepMode};
use crate::connection::{ClusterConnection, ClusterConnector};
use crate::errors::{ConnectionError, FieldRole, StepError};
use crate::model::{FieldValue, Row, RowSchema};
use crate::resolver::{ResolvedSchema, RowSchemaResolver, ValueSlot};

/// Cada cuántas filas leídas se registra una línea de progreso.
pub const DEFAULT_FEEDBACK_INTERVAL: u64 = 50_000;

/// Contadores de una ejecución.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepCounters {
    pub lines_read: u64,
    pub lines_written: u64,
    pub errors: u64,
}

/// Una copia de un step fetch/store. Posee su configuración y su conexión;
/// copias paralelas del mismo step nunca comparten conexión.
pub struct RowStep<C: ClusterConnector> {
    name: String,
    copy_nr: usize,
    run_id: Uuid,
    mode: StepMode,
    config: StepConfig,
    connector: C,
    connection: Option<ClusterConnection>,
    state: StepState,
    resolved: Option<ResolvedSchema>,
    stop: StopSignal,
    counters: StepCounters,
    feedback_interval: u64,
}

impl<C: ClusterConnector> RowStep<C> {
    pub fn new(name: impl Into<String>, mode: StepMode, config: StepConfig, connector: C) -> Self {
        Self { name: name.into(),
               copy_nr: 0,
               run_id: Uuid::new_v4(),
               mode,
               config,
               connector,
               connection: None,
               state: StepState::Uninitialized,
               resolved: None,
               stop: StopSignal::new(),
               counters: StepCounters::default(),
               feedback_interval: DEFAULT_FEEDBACK_INTERVAL }
    }

    /// Step que enriquece cada fila con el valor leído por clave.
    pub fn fetch(name: impl Into<String>, config: StepConfig, connector: C) -> Self {
        Self::new(name, StepMode::Fetch, config, connector)
    }

    /// Step que persiste el par clave/valor de cada fila.
    pub fn store(name: impl Into<String>, config: StepConfig, connector: C) -> Self {
        Self::new(name, StepMode::Store, config, connector)
    }

    pub fn with_copy_nr(mut self, copy_nr: usize) -> Self {
        self.copy_nr = copy_nr;
        self
    }

    /// 0 desactiva el log de progreso.
    pub fn with_feedback_interval(mut self, interval: u64) -> Self {
        self.feedback_interval = interval;
        self
    }

    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn copy_nr(&self) -> usize {
        self.copy_nr
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn mode(&self) -> StepMode {
        self.mode
    }

    pub fn config(&self) -> &StepConfig {
        &self.config
    }

    pub fn state(&self) -> StepState {
        self.state
    }

    pub fn counters(&self) -> StepCounters {
        self.counters
    }

    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Schema de salida congelado (disponible tras la primera fila).
    pub fn output_schema(&self) -> Option<&Arc<RowSchema>> {
        self.resolved.as_ref().map(|r| &r.output)
    }

    pub fn is_connection_open(&self) -> bool {
        self.connection.as_ref().is_some_and(ClusterConnection::is_open)
    }

    /// `Uninitialized -> Connected`: valida la configuración y abre la
    /// conexión al cluster. Cualquier fallo deja el step en `Failed`.
    pub fn init(&mut self) -> Result<(), StepError> {
        if self.state != StepState::Uninitialized {
            return Err(StepError::InvalidState(self.state));
        }
        info!("init:start step={} copy={} run={} mode={}",
              self.name, self.copy_nr, self.run_id, self.mode);
        if let Err(e) = self.config.validate(self.mode) {
            return Err(self.fail(e.into()));
        }
        let mut connection = ClusterConnection::new(self.config.endpoints().clone());
        if let Err(e) = connection.connect(&self.connector) {
            drop(connection);
            return Err(self.fail(e.into()));
        }
        self.connection = Some(connection);
        self.state = StepState::Connected;
        info!("init:done step={} copy={} run={}", self.name, self.copy_nr, self.run_id);
        Ok(())
    }

    /// Procesa (a lo sumo) una fila.
    ///
    /// Devuelve `Ok(true)` si se emitió una fila y hay que seguir llamando,
    /// `Ok(false)` si el step terminó (fin de entrada o parada solicitada).
    /// Cualquier error es fatal: el step pasa a `Failed` sin emitir la fila.
    pub fn process_row(&mut self, source: &mut dyn RowSource, sink: &mut dyn RowSink) -> Result<bool, StepError> {
        if self.state != StepState::Connected {
            return Err(StepError::InvalidState(self.state));
        }
        if self.stop.is_stop_requested() {
            info!("process_row:stopped step={} copy={} lines_read={}",
                  self.name, self.copy_nr, self.counters.lines_read);
            self.finish(sink);
            return Ok(false);
        }
        let Some(row) = source.next_row() else {
            self.finish(sink);
            return Ok(false);
        };
        self.counters.lines_read += 1;

        match self.handle_row(source.schema(), row) {
            Ok((schema, out)) => {
                sink.put_row(&schema, out);
                self.counters.lines_written += 1;
                if self.feedback_interval > 0 && self.counters.lines_read % self.feedback_interval == 0 {
                    info!("process_row:feedback step={} copy={} lines_read={}",
                          self.name, self.copy_nr, self.counters.lines_read);
                }
                Ok(true)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// `Connected -> Done` explícito cuando el anfitrión sabe que no hay más
    /// entrada.
    pub fn on_end_of_input(&mut self, sink: &mut dyn RowSink) -> Result<(), StepError> {
        if self.state != StepState::Connected {
            return Err(StepError::InvalidState(self.state));
        }
        self.finish(sink);
        Ok(())
    }

    /// Ejecuta el step completo: init (si hace falta) y filas hasta terminar.
    pub fn run(&mut self, source: &mut dyn RowSource, sink: &mut dyn RowSink) -> Result<StepCounters, StepError> {
        if self.state == StepState::Uninitialized {
            self.init()?;
        }
        while self.process_row(source, sink)? {}
        Ok(self.counters)
    }

    /// Libera la conexión. Un step aún conectado queda en `Done`.
    pub fn dispose(&mut self) {
        self.release_connection();
        if self.state == StepState::Connected {
            self.state = StepState::Done;
        }
    }

    fn handle_row(&mut self, input: &RowSchema, row: Row) -> Result<(Arc<RowSchema>, Row), StepError> {
        let resolved = match self.resolved.clone() {
            Some(r) => r,
            None => {
                let r = RowSchemaResolver::resolve(input, &self.config, self.mode, &self.name)?;
                self.resolved = Some(r.clone());
                r
            }
        };
        let connection = self.connection
                             .as_mut()
                             .ok_or(StepError::Connection(ConnectionError::NotConnected))?;
        let out = match self.mode {
            StepMode::Fetch => fetch_row(connection, &self.config, &resolved, row)?,
            StepMode::Store => store_row(connection, &self.config, &resolved, row)?,
        };
        Ok((resolved.output, out))
    }

    fn finish(&mut self, sink: &mut dyn RowSink) {
        self.state = StepState::Done;
        self.release_connection();
        sink.set_output_done();
        info!("finish:done step={} copy={} lines_read={} lines_written={}",
              self.name, self.copy_nr, self.counters.lines_read, self.counters.lines_written);
    }

    fn fail(&mut self, e: StepError) -> StepError {
        self.state = StepState::Failed;
        self.counters.errors += 1;
        self.release_connection();
        error!("step failed step={} copy={} run={} lines_read={} err={}",
               self.name, self.copy_nr, self.run_id, self.counters.lines_read, e);
        e
    }

    fn release_connection(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            connection.close();
            debug!("release:done step={} copy={}", self.name, self.copy_nr);
        }
    }
}

/// Lee la clave, consulta el cluster y coloca el valor (o nulo si no
/// existe) en su posición: sobrescribe o agrega al final.
fn fetch_row(connection: &mut ClusterConnection,
             config: &StepConfig,
             resolved: &ResolvedSchema,
             mut row: Row)
             -> Result<Row, StepError> {
    let key = field_bytes(&row, resolved.key_index, config.key_field_name(), FieldRole::Key)?;
    let fetched = connection.get(&key)?.unwrap_or(FieldValue::Null);
    match resolved.value_slot {
        ValueSlot::Existing(idx) => {
            // fila más corta que su schema
            if !row.put(idx, fetched) {
                return Err(StepError::FieldNotFound { field: config.value_field_name().to_string(),
                                                      role: FieldRole::Value });
            }
        }
        ValueSlot::Appended => row.push(fetched),
    }
    Ok(row)
}

/// Escribe el par clave/valor; la fila pasa sin cambios.
fn store_row(connection: &mut ClusterConnection,
             config: &StepConfig,
             resolved: &ResolvedSchema,
             row: Row)
             -> Result<Row, StepError> {
    let key = field_bytes(&row, resolved.key_index, config.key_field_name(), FieldRole::Key)?;
    let value = field_bytes(&row, resolved.value_index(), config.value_field_name(), FieldRole::Value)?;
    connection.set(&key, &value, config.expiration_seconds())?;
    Ok(row)
}

fn field_bytes(row: &Row, index: usize, name: &str, role: FieldRole) -> Result<Vec<u8>, StepError> {
    row.get(index)
       .and_then(FieldValue::to_store_bytes)
       .ok_or_else(|| StepError::NullField { field: name.to_string(), role })
}
