//! Requirement extraction - the planning dual of chain construction.
//!
//! Chain construction assumes the inputs are already in hand and wants an
//! executable plan; this walk assumes nothing is in hand and answers what a
//! caller must be prepared to supply directly so that some resolution of the
//! target through the catalog will succeed. Nothing is executed.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, trace};

use crate::catalog::Catalog;
use crate::errors::ResolverError;
use crate::func::Func;
use crate::slot::{Slot, SlotKey};

impl Catalog {
    /// Compute the slots a caller must supply directly for `target` to be
    /// resolvable through this catalog.
    ///
    /// `check` answers "can the caller directly produce this slot?". Slots
    /// it accepts are accumulated; every other required slot must have a
    /// producer in the catalog, whose own arguments are folded into the
    /// same accumulation. Each candidate mapper is visited at most once per
    /// attempt. Returns the accumulated slots in first-discovery order, or
    /// fails with [`ResolverError::Unmappable`] if some required slot is
    /// neither suppliable nor producible.
    pub fn input_set(
        &self,
        target: &Func,
        check: impl Fn(&dyn Slot) -> bool,
    ) -> Result<Vec<Arc<dyn Slot>>> {
        let mut state = InputState {
            catalog: self,
            check: &check,
            pending: Vec::new(),
            pending_keys: HashSet::new(),
            missing: HashSet::new(),
            visited: HashSet::new(),
        };
        state.gather(target)?;
        debug!(
            func = %target.name(),
            required = state.pending.len(),
            mapped = state.missing.len(),
            "computed required input set"
        );
        Ok(state.pending)
    }
}

struct InputState<'c, 'f> {
    catalog: &'c Catalog,
    check: &'f dyn Fn(&dyn Slot) -> bool,
    /// Slots the caller will need to supply, in first-discovery order.
    pending: Vec<Arc<dyn Slot>>,
    pending_keys: HashSet<SlotKey>,
    /// Keys neither directly suppliable nor yet pending.
    missing: HashSet<SlotKey>,
    /// Mappers already used within this attempt.
    visited: HashSet<usize>,
}

impl InputState<'_, '_> {
    fn gather(&mut self, func: &Func) -> Result<()> {
        let catalog = self.catalog;
        for slot in func.args() {
            let key = slot.key();
            if self.pending_keys.contains(&key) {
                continue;
            }
            if (self.check)(slot.as_ref()) {
                trace!(slot = %slot, "caller supplies slot directly");
                self.pending_keys.insert(key);
                self.pending.push(Arc::clone(slot));
                continue;
            }

            self.missing.insert(key);
            let mut covered = false;
            for &candidate in catalog.producers(&key) {
                if self.visited.contains(&candidate) {
                    continue;
                }
                self.visited.insert(candidate);
                let mapper = catalog.funcs()[candidate].as_ref();
                trace!(slot = %slot, mapper = %mapper.name(), "following producer");
                if self.gather(mapper).is_ok() {
                    covered = true;
                    break;
                }
            }
            if !covered {
                return Err(ResolverError::Unmappable {
                    slot: slot.to_string(),
                    func: func.name().to_string(),
                }
                .into());
            }
        }
        Ok(())
    }
}
