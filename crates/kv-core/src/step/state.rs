/// Estado de un step en tiempo de ejecución.
///
/// Las transiciones válidas son:
/// - `Uninitialized` -> `Connected` (init correcto)
/// - `Uninitialized` -> `Failed` (config inválida o cluster inalcanzable)
/// - `Connected` -> `Done` (fin de entrada o parada solicitada)
/// - `Connected` -> `Failed` (cualquier error al procesar una fila)
///
/// `Done` y `Failed` son terminales.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    Uninitialized,
    Connected,
    Done,
    Failed,
}

impl StepState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StepState::Done | StepState::Failed)
    }
}
