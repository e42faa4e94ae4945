use serde::{Deserialize, Serialize};

use super::ValueType;

/// Descriptor de un campo: nombre, tipo declarado y step de origen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMeta {
    pub name: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

impl FieldMeta {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self { name: name.into(), value_type, origin: None }
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }
}

/// Secuencia ordenada de descriptores de campo. Una vez resuelta para una
/// ejecución se comparte por referencia (`Arc`) entre todas las filas.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowSchema {
    fields: Vec<FieldMeta>,
}

impl RowSchema {
    pub fn new(fields: Vec<FieldMeta>) -> Self {
        Self { fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &[FieldMeta] {
        &self.fields
    }

    pub fn field(&self, index: usize) -> Option<&FieldMeta> {
        self.fields.get(index)
    }

    /// Índice del primer campo con ese nombre.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Copia del schema con un descriptor extra al final.
    pub fn appended(&self, field: FieldMeta) -> Self {
        let mut fields = Vec::with_capacity(self.fields.len() + 1);
        fields.extend(self.fields.iter().cloned());
        fields.push(field);
        Self { fields }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}

impl FromIterator<FieldMeta> for RowSchema {
    fn from_iter<T: IntoIterator<Item = FieldMeta>>(iter: T) -> Self {
        Self { fields: iter.into_iter().collect() }
    }
}
