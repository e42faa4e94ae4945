//! Verificación en tiempo de diseño de un step (antes de ejecutar).
//!
//! Produce observaciones ordenadas sobre la configuración y la entrada que
//! recibirá el step: campos recibidos, saltos de entrada, presencia de los
//! campos clave/valor y validez de la configuración.

use serde::Serialize;

use crate::config::{StepConfig, StepMode};
use crate::model::RowSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RemarkKind {
    Ok,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckRemark {
    pub kind: RemarkKind,
    pub message: String,
}

impl CheckRemark {
    fn new(kind: RemarkKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }
}

/// Revisa un step dado el schema del step previo (si se conoce) y la
/// cantidad de saltos de entrada que llegan a él.
pub fn check_step(config: &StepConfig,
                  mode: StepMode,
                  prev: Option<&RowSchema>,
                  input_hops: usize)
                  -> Vec<CheckRemark> {
    let mut remarks = Vec::new();

    match prev {
        Some(schema) if !schema.is_empty() => {
            remarks.push(CheckRemark::new(RemarkKind::Ok,
                                          format!("step is connected to previous one, receiving {} fields",
                                                  schema.len())));
        }
        _ => remarks.push(CheckRemark::new(RemarkKind::Warning, "not receiving any fields from previous steps")),
    }

    if input_hops > 0 {
        remarks.push(CheckRemark::new(RemarkKind::Ok, "step is receiving info from other steps"));
    } else {
        remarks.push(CheckRemark::new(RemarkKind::Error, "no input received from other steps"));
    }

    if let Err(e) = config.validate(mode) {
        remarks.push(CheckRemark::new(RemarkKind::Error, format!("invalid configuration: {e}")));
    }

    if let Some(schema) = prev.filter(|s| !s.is_empty()) {
        let key = config.key_field_name();
        if !key.is_empty() && schema.index_of(key).is_none() {
            remarks.push(CheckRemark::new(RemarkKind::Error, format!("key field '{key}' not found in input")));
        }
        let value = config.value_field_name();
        if !value.is_empty() && schema.index_of(value).is_none() {
            match mode {
                StepMode::Store => {
                    remarks.push(CheckRemark::new(RemarkKind::Error,
                                                  format!("value field '{value}' not found in input")))
                }
                StepMode::Fetch => remarks.push(CheckRemark::new(RemarkKind::Ok,
                                                                 format!("value field '{value}' will be appended"))),
            }
        }
    }

    remarks
}
