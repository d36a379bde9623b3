//! Live subsystem handles kept alongside the configuration

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

/// Handles that training code shares through the runtime context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handle {
    /// The loaded tokenizer
    Tokenizer,
    /// The TensorBoard summary writer
    TensorboardWriter,
    /// The cluster auto-resume object
    AdlrAutoresume,
}

/// Typed store for live objects such as the tokenizer
///
/// These are resources, not configuration values: they are never merged,
/// validated or exported, and the configuration does not depend on them.
///
/// ```
/// use neox_args::runtime::{Handle, RuntimeContext};
///
/// struct Tokenizer { vocab: usize }
///
/// let mut ctx = RuntimeContext::new();
/// ctx.insert(Handle::Tokenizer, Tokenizer { vocab: 50257 });
/// assert_eq!(ctx.get::<Tokenizer>(Handle::Tokenizer).map(|t| t.vocab), Some(50257));
/// ```
#[derive(Default)]
pub struct RuntimeContext {
    handles: HashMap<Handle, Box<dyn Any + Send + Sync>>,
}

impl RuntimeContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a handle, returning true if one was replaced
    pub fn insert<T: Any + Send + Sync>(&mut self, handle: Handle, value: T) -> bool {
        self.handles.insert(handle, Box::new(value)).is_some()
    }

    /// The handle, if present and of type `T`
    pub fn get<T: Any>(&self, handle: Handle) -> Option<&T> {
        self.handles.get(&handle)?.downcast_ref()
    }

    pub fn get_mut<T: Any>(&mut self, handle: Handle) -> Option<&mut T> {
        self.handles.get_mut(&handle)?.downcast_mut()
    }

    pub fn remove(&mut self, handle: Handle) -> bool {
        self.handles.remove(&handle).is_some()
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.handles.contains_key(&handle)
    }
}

impl fmt::Debug for RuntimeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.handles.keys()).finish()
    }
}
