//! Resolución del schema de salida, una vez por ejecución (primera fila).
//!
//! - fetch: si el campo valor ya existe en el schema de entrada la salida es
//!   el mismo schema (el valor se sobrescribe en su posición); si no existe se
//!   agrega un único descriptor `(valueFieldName, valueType)` al final.
//! - store: la salida es siempre el schema de entrada; clave y valor deben
//!   existir.
//!
//! El tipo declarado es sólo metadata del schema.

use std::sync::Arc;

use log::debug;

use crate::config::{StepConfig, StepMode};
use crate::errors::{FieldRole, StepError};
use crate::model::{FieldMeta, RowSchema};

/// Dónde vive el campo valor dentro de las filas de salida.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSlot {
    /// El campo existe en la entrada en este índice.
    Existing(usize),
    /// El campo se agrega al final de cada fila.
    Appended,
}

/// Resultado congelado de la resolución para una ejecución.
#[derive(Debug, Clone)]
pub struct ResolvedSchema {
    pub output: Arc<RowSchema>,
    pub key_index: usize,
    pub value_slot: ValueSlot,
}

impl ResolvedSchema {
    /// Índice del campo valor en el schema de salida.
    pub fn value_index(&self) -> usize {
        match self.value_slot {
            ValueSlot::Existing(i) => i,
            ValueSlot::Appended => self.output.len() - 1,
        }
    }
}

pub struct RowSchemaResolver;

impl RowSchemaResolver {
    /// Calcula el schema de salida a partir del schema de entrada.
    ///
    /// `origin` se registra en el descriptor agregado (nombre del step).
    pub fn resolve(input: &RowSchema,
                   config: &StepConfig,
                   mode: StepMode,
                   origin: &str)
                   -> Result<ResolvedSchema, StepError> {
        let key_name = config.key_field_name();
        let value_name = config.value_field_name();
        let key_index = input.index_of(key_name)
                             .ok_or_else(|| StepError::FieldNotFound { field: key_name.to_string(),
                                                                       role: FieldRole::Key })?;
        let existing = input.index_of(value_name);

        let resolved = match (mode, existing) {
            (StepMode::Fetch, Some(idx)) => ResolvedSchema { output: Arc::new(input.clone()),
                                                             key_index,
                                                             value_slot: ValueSlot::Existing(idx) },
            (StepMode::Fetch, None) => {
                let value_type = config.value_type()?;
                let meta = FieldMeta::new(value_name, value_type).with_origin(origin);
                ResolvedSchema { output: Arc::new(input.appended(meta)),
                                 key_index,
                                 value_slot: ValueSlot::Appended }
            }
            (StepMode::Store, Some(idx)) => ResolvedSchema { output: Arc::new(input.clone()),
                                                             key_index,
                                                             value_slot: ValueSlot::Existing(idx) },
            (StepMode::Store, None) => {
                return Err(StepError::FieldNotFound { field: value_name.to_string(),
                                                     role: FieldRole::Value })
            }
        };
        debug!("resolve:done origin={origin} mode={mode} in_fields={} out_fields={} slot={:?}",
               input.len(),
               resolved.output.len(),
               resolved.value_slot);
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClusterEndpoint;
    use crate::model::ValueType;

    fn input() -> RowSchema {
        RowSchema::new(vec![FieldMeta::new("id", ValueType::Integer), FieldMeta::new("key", ValueType::String)])
    }

    fn seeds() -> Vec<ClusterEndpoint> {
        vec![ClusterEndpoint::new("localhost", 7000)]
    }

    #[test]
    fn fetch_appends_one_trailing_field() {
        let cfg = StepConfig::fetch("key", "val", "Integer", seeds());
        let r = RowSchemaResolver::resolve(&input(), &cfg, StepMode::Fetch, "lookup").unwrap();
        assert_eq!(r.output.len(), 3);
        assert_eq!(r.key_index, 1);
        assert_eq!(r.value_slot, ValueSlot::Appended);
        assert_eq!(r.value_index(), 2);
        let added = r.output.field(2).unwrap();
        assert_eq!(added.name, "val");
        assert_eq!(added.value_type, ValueType::Integer);
        assert_eq!(added.origin.as_deref(), Some("lookup"));
    }

    #[test]
    fn fetch_keeps_schema_when_value_field_exists() {
        let schema = input().appended(FieldMeta::new("val", ValueType::String));
        let cfg = StepConfig::fetch("key", "val", "Integer", seeds());
        let r = RowSchemaResolver::resolve(&schema, &cfg, StepMode::Fetch, "lookup").unwrap();
        assert_eq!(*r.output, schema);
        assert_eq!(r.value_slot, ValueSlot::Existing(2));
    }

    #[test]
    fn missing_key_field_is_reported() {
        let cfg = StepConfig::fetch("nokey", "val", "String", seeds());
        let err = RowSchemaResolver::resolve(&input(), &cfg, StepMode::Fetch, "lookup").unwrap_err();
        assert_eq!(err, StepError::FieldNotFound { field: "nokey".into(), role: FieldRole::Key });
    }

    #[test]
    fn store_requires_value_field() {
        let cfg = StepConfig::store("key", "val", 0, seeds());
        let err = RowSchemaResolver::resolve(&input(), &cfg, StepMode::Store, "save").unwrap_err();
        assert_eq!(err, StepError::FieldNotFound { field: "val".into(), role: FieldRole::Value });

        let schema = input().appended(FieldMeta::new("val", ValueType::String));
        let r = RowSchemaResolver::resolve(&schema, &cfg, StepMode::Store, "save").unwrap();
        assert_eq!(*r.output, schema);
        assert_eq!(r.value_index(), 2);
    }
}
