//! Entrada/salida en JSON por líneas.
//!
//! Entrada: la primera línea es el schema (`[{"name": .., "type": ..}]`),
//! cada línea siguiente una fila como arreglo JSON. La salida usa el mismo
//! formato con el schema resuelto por el step.

use std::io::{BufRead, Write};
use std::sync::Arc;

use kv_core::{FieldValue, Row, RowSchema, RowSink, VecRowSource};
use serde_json::Value as JsonValue;

pub fn parse_schema(line: &str) -> Result<RowSchema, String> {
    serde_json::from_str(line).map_err(|e| format!("invalid schema line: {e}"))
}

pub fn parse_row(line: &str, schema: &RowSchema) -> Result<Row, String> {
    let json: JsonValue = serde_json::from_str(line).map_err(|e| format!("invalid row: {e}"))?;
    let JsonValue::Array(items) = json else {
        return Err("row must be a JSON array".to_string());
    };
    if items.len() != schema.len() {
        return Err(format!("row has {} values, schema has {} fields", items.len(), schema.len()));
    }
    let values = items.iter()
                      .zip(schema.fields())
                      .map(|(v, meta)| FieldValue::from_json_typed(v, meta.value_type))
                      .collect::<Vec<_>>();
    Ok(Row::new(values))
}

/// Lee toda la entrada antes de arrancar el step; un error de formato no
/// deja filas a medio procesar.
pub fn read_input<R: BufRead>(reader: R) -> Result<VecRowSource, String> {
    let mut lines = reader.lines()
                          .enumerate()
                          .filter(|(_, l)| l.as_ref().map(|s| !s.trim().is_empty()).unwrap_or(true));
    let schema = match lines.next() {
        Some((_, line)) => parse_schema(&line.map_err(|e| format!("read error: {e}"))?)?,
        None => return Err("empty input: schema line expected".to_string()),
    };
    let mut rows = Vec::new();
    for (n, line) in lines {
        let line = line.map_err(|e| format!("read error: {e}"))?;
        rows.push(parse_row(&line, &schema).map_err(|e| format!("line {}: {e}", n + 1))?);
    }
    Ok(VecRowSource::new(schema, rows))
}

/// Sink que escribe el schema antes de la primera fila. Guarda el primer
/// error de escritura para reportarlo al terminar.
pub struct JsonLinesSink<W: Write> {
    out: W,
    schema_written: bool,
    rows_written: u64,
    error: Option<std::io::Error>,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out, schema_written: false, rows_written: 0, error: None }
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    pub fn finish(mut self) -> Result<W, std::io::Error> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        self.out.flush()?;
        Ok(self.out)
    }

    fn write_line(&mut self, value: &JsonValue) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = writeln!(self.out, "{value}") {
            self.error = Some(e);
        }
    }
}

impl<W: Write> RowSink for JsonLinesSink<W> {
    fn put_row(&mut self, schema: &Arc<RowSchema>, row: Row) {
        if !self.schema_written {
            let schema_json = serde_json::to_value(schema.as_ref()).unwrap_or(JsonValue::Null);
            self.write_line(&schema_json);
            self.schema_written = true;
        }
        let values = row.values().iter().map(FieldValue::to_json).collect::<Vec<_>>();
        self.write_line(&JsonValue::Array(values));
        self.rows_written += 1;
    }

    fn set_output_done(&mut self) {
        if self.error.is_none() {
            if let Err(e) = self.out.flush() {
                self.error = Some(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kv_core::{FieldMeta, RowSource, ValueType};

    const INPUT: &str = "[{\"name\":\"id\",\"type\":\"Integer\"},{\"name\":\"key\",\"type\":\"String\"}]\n\
                         [1,\"user:1\"]\n\
                         \n\
                         [2,\"user:2\"]\n";

    #[test]
    fn reads_schema_then_rows() {
        let mut source = read_input(INPUT.as_bytes()).unwrap();
        assert_eq!(source.schema().names().collect::<Vec<_>>(), vec!["id", "key"]);
        assert_eq!(source.remaining(), 2);
        let first = source.next_row().unwrap();
        assert_eq!(first.values(), &[FieldValue::Integer(1), "user:1".into()]);
    }

    #[test]
    fn rejects_rows_with_wrong_arity() {
        let input = "[{\"name\":\"key\",\"type\":\"String\"}]\n[\"a\",\"b\"]\n";
        let err = read_input(input.as_bytes()).unwrap_err();
        assert!(err.starts_with("line 2:"), "{err}");
    }

    #[test]
    fn rejects_empty_input() {
        assert!(read_input("".as_bytes()).is_err());
    }

    #[test]
    fn sink_writes_schema_once() {
        let schema = Arc::new(RowSchema::new(vec![FieldMeta::new("key", ValueType::String)]));
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.put_row(&schema, Row::new(vec!["a".into()]));
        sink.put_row(&schema, Row::new(vec![FieldValue::Null]));
        sink.set_output_done();
        assert_eq!(sink.rows_written(), 2);
        let out = String::from_utf8(sink.finish().unwrap()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines, vec!["[{\"name\":\"key\",\"type\":\"String\"}]", "[\"a\"]", "[null]"]);
    }
}
