//! The mapper catalog - an explicit, immutable-after-build registry of
//! candidate funcs.
//!
//! Hosts register every mapper a plugin advertises at load time, then build
//! the catalog once and share it. The built catalog indexes producers by
//! output slot key, preserves registration order, and never mutates, so
//! concurrent resolutions against it need no locking.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::func::Func;
use crate::slot::{Slot, SlotKey};

/// Accumulates funcs in registration order.
#[derive(Default)]
pub struct CatalogBuilder {
    funcs: Vec<Arc<Func>>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a candidate mapper.
    ///
    /// Registration order matters: when several mappers produce the same
    /// slot, resolution tries them in the order they were registered and
    /// uses the first one that fully resolves.
    pub fn register(mut self, func: Func) -> Self {
        self.funcs.push(Arc::new(func));
        self
    }

    /// Register every func in `funcs`, preserving iteration order.
    pub fn register_all(mut self, funcs: impl IntoIterator<Item = Func>) -> Self {
        self.funcs.extend(funcs.into_iter().map(Arc::new));
        self
    }

    /// Freeze the registry and index producers by output slot key.
    pub fn build(self) -> Catalog {
        let mut by_output: HashMap<SlotKey, Vec<usize>> = HashMap::new();
        for (idx, func) in self.funcs.iter().enumerate() {
            by_output.entry(func.output().key()).or_default().push(idx);
        }
        Catalog {
            funcs: self.funcs,
            by_output,
        }
    }
}

/// The finalized mapper registry used by resolution.
pub struct Catalog {
    funcs: Vec<Arc<Func>>,
    by_output: HashMap<SlotKey, Vec<usize>>,
}

impl Catalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::new()
    }

    /// An empty catalog.
    pub fn empty() -> Catalog {
        CatalogBuilder::new().build()
    }

    pub fn len(&self) -> usize {
        self.funcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funcs.is_empty()
    }

    /// Registered funcs, in registration order.
    pub fn funcs(&self) -> &[Arc<Func>] {
        &self.funcs
    }

    /// Indices of funcs producing `key`, in registration order.
    pub(crate) fn producers(&self, key: &SlotKey) -> &[usize] {
        self.by_output.get(key).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catalog")
            .field("funcs", &self.funcs.len())
            .field("outputs", &self.by_output.len())
            .finish()
    }
}
