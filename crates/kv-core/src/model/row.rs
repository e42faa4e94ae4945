use super::FieldValue;

/// Fila: valores alineados posicionalmente con un `RowSchema`.
///
/// Cada instancia tiene un único dueño; el step la recibe por valor y la
/// devuelve (posiblemente ensanchada) al sink.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    values: Vec<FieldValue>,
}

impl Row {
    pub fn new(values: Vec<FieldValue>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FieldValue> {
        self.values.get(index)
    }

    pub fn values(&self) -> &[FieldValue] {
        &self.values
    }

    pub fn into_values(self) -> Vec<FieldValue> {
        self.values
    }

    /// Reemplaza el valor en `index`. Devuelve `false` (sin modificar la
    /// fila) si la posición no existe.
    pub fn put(&mut self, index: usize, value: FieldValue) -> bool {
        match self.values.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn push(&mut self, value: FieldValue) {
        self.values.push(value);
    }
}

impl From<Vec<FieldValue>> for Row {
    fn from(values: Vec<FieldValue>) -> Self {
        Self { values }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_overwrites_existing_positions_only() {
        let mut row = Row::new(vec![FieldValue::Integer(1), "a".into()]);
        assert!(row.put(1, "b".into()));
        assert_eq!(row.values(), &[FieldValue::Integer(1), "b".into()]);
        assert!(!row.put(3, "d".into()));
        assert_eq!(row.len(), 2);
    }
}
