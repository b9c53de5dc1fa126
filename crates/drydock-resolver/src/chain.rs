//! Chain construction and execution.
//!
//! Given a target func, seed values, and a catalog of candidate mappers,
//! resolution produces an ordered, executable plan: mappers first, target
//! last, such that folding each step's result into the value pool leaves
//! every later step satisfiable. This is a satisfiability search, not an
//! optimizer - candidates are tried in registration order and the first one
//! that fully resolves wins.
//!
//! Resolution state (pending funcs as the cycle guard, satisfied output
//! keys as the memo) lives in a per-call struct and is discarded when the
//! call returns. Failure anywhere aborts the whole attempt; there is no
//! partial chain.

use std::collections::HashSet;
use std::fmt;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::catalog::Catalog;
use crate::errors::ResolverError;
use crate::func::Func;
use crate::slot::{Slot, SlotKey};
use crate::value::Value;

impl Catalog {
    /// Build an executable chain that leaves `target` fully satisfiable.
    ///
    /// If the seed values already satisfy every argument of `target`, the
    /// chain contains only `target`, whatever the catalog holds. Fails with
    /// [`ResolverError::Unmappable`] when some required slot has no
    /// resolvable producer - including when the only producers depend,
    /// directly or transitively, on their own output.
    pub fn chain<'c>(&'c self, target: &'c Func, seeds: Vec<Value>) -> Result<Chain<'c>> {
        let mut state = ResolveState {
            catalog: self,
            seeds: &seeds,
            pending: HashSet::new(),
            satisfied: HashSet::new(),
            order: Vec::new(),
        };
        state.resolve(FuncId::Target, target)?;
        let order = state.order;
        debug!(func = %target.name(), steps = order.len(), "resolved chain");
        Ok(Chain {
            steps: order,
            values: seeds,
        })
    }
}

/// Identity of a func within one resolution attempt.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
enum FuncId {
    Target,
    Mapper(usize),
}

struct ResolveState<'c, 's> {
    catalog: &'c Catalog,
    seeds: &'s [Value],
    /// Funcs currently on the resolution stack.
    pending: HashSet<FuncId>,
    /// Output keys of steps already committed to the chain.
    satisfied: HashSet<SlotKey>,
    order: Vec<&'c Func>,
}

impl<'c> ResolveState<'c, '_> {
    fn resolve(&mut self, id: FuncId, func: &'c Func) -> Result<()> {
        let catalog = self.catalog;
        let missing = func.missing_args(self.seeds);
        if missing.is_empty() {
            self.commit(func);
            return Ok(());
        }

        let mut ordered: Vec<(SlotKey, usize)> = missing.into_iter().collect();
        ordered.sort_by_key(|(_, idx)| *idx);
        trace!(func = %func.name(), missing = ordered.len(), "resolving func arguments");

        self.pending.insert(id);
        for (key, idx) in ordered {
            if self.satisfied.contains(&key) {
                continue;
            }
            let slot = &func.args()[idx];
            let mut covered = false;
            for &candidate in catalog.producers(&key) {
                let cid = FuncId::Mapper(candidate);
                if self.pending.contains(&cid) {
                    continue;
                }
                let mapper = catalog.funcs()[candidate].as_ref();
                trace!(func = %func.name(), slot = %slot, mapper = %mapper.name(), "trying candidate");
                if self.resolve(cid, mapper).is_ok() {
                    covered = true;
                    break;
                }
            }
            if !covered {
                self.pending.remove(&id);
                return Err(ResolverError::Unmappable {
                    slot: slot.to_string(),
                    func: func.name().to_string(),
                }
                .into());
            }
        }
        self.pending.remove(&id);
        self.commit(func);
        Ok(())
    }

    fn commit(&mut self, func: &'c Func) {
        self.satisfied.insert(func.output().key());
        self.order.push(func);
        trace!(func = %func.name(), "committed step");
    }
}

/// An ordered, executable plan: mapper steps followed by the target, plus
/// the shared value pool they bind against.
///
/// Built fresh per resolution attempt and consumed by [`Chain::call`];
/// never reused across resolutions.
pub struct Chain<'c> {
    steps: Vec<&'c Func>,
    values: Vec<Value>,
}

impl<'c> Chain<'c> {
    /// The resolved steps in call order; the last one is the target.
    pub fn steps(&self) -> &[&'c Func] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Execute the chain: call each step in order, folding its result into
    /// the value pool before the next step runs.
    ///
    /// The first error aborts immediately and is returned unmodified; the
    /// last step's result is the chain's result.
    pub fn call(mut self) -> Result<Value> {
        let total = self.steps.len();
        let mut last = None;
        for (idx, func) in self.steps.iter().enumerate() {
            debug!(step = idx + 1, total = total, func = %func.name(), "calling chain step");
            let value = func.call(&self.values)?;
            self.values.push(value.clone());
            last = Some(value);
        }
        last.ok_or_else(|| anyhow!("chain has no steps"))
    }

    /// A serializable description of the resolved steps.
    pub fn plan(&self) -> ChainPlan {
        let steps = self
            .steps
            .iter()
            .enumerate()
            .map(|(index, func)| ChainStepPlan {
                index,
                func: func.name().to_string(),
                args: func.args().iter().map(|slot| slot.to_string()).collect(),
                output: func.output().to_string(),
            })
            .collect();
        ChainPlan {
            target: self
                .steps
                .last()
                .map(|func| func.name().to_string())
                .unwrap_or_default(),
            steps,
        }
    }
}

impl fmt::Display for Chain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, func) in self.steps.iter().enumerate() {
            if idx > 0 {
                write!(f, " -> ")?;
            }
            f.write_str(func.name())?;
        }
        Ok(())
    }
}

impl fmt::Debug for Chain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("steps", &self.to_string())
            .field("values", &self.values.len())
            .finish()
    }
}

/// Canonical chain description, one entry per resolved step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainPlan {
    pub target: String,
    pub steps: Vec<ChainStepPlan>,
}

/// One step of a [`ChainPlan`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainStepPlan {
    pub index: usize,
    pub func: String,
    pub args: Vec<String>,
    pub output: String,
}
