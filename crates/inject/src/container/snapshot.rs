use crate::container::lookup::Lookup;
use crate::container::middleware::Next;

/// Saved registry and middleware chain of a container
pub struct ContainerSnapshot {
    pub bindings: Lookup,
    pub middleware: Option<Next>,
}

impl ContainerSnapshot {
    pub fn of(bindings: Lookup, middleware: Option<Next>) -> Self {
        Self {
            bindings,
            middleware,
        }
    }
}

impl std::fmt::Debug for ContainerSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerSnapshot")
            .field("bindings", &self.bindings.len())
            .field("middleware", &self.middleware.is_some())
            .finish()
    }
}
