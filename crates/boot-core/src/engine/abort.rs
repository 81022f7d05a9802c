use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Señal de aborto compartida entre el engine y quien lo controla (p.ej. el
/// handler de Ctrl-C). El engine sólo la consulta entre steps.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal(Arc<AtomicBool>);

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
