//! Wrapped callables with typed positional argument slots and one output
//! slot.
//!
//! A [`Func`] is immutable once constructed. There are two ways to build
//! one:
//!
//! - **Typed**: [`Func::new`] / [`Func::builder`] take a closure and derive
//!   each parameter's slot and the output slot from the signature. Closures
//!   return `anyhow::Result<T>`; infallible mappers just return `Ok(..)`.
//! - **Described**: [`Func::from_parts`] takes explicit slot lists plus an
//!   erased callable, for hosts that learn plugin signatures dynamically and
//!   bind a generic dispatcher. The callable must produce a value carrying
//!   the declared output slot's key.
//!
//! Binding walks declared arguments in order against a value pool; a
//! [`PreparedFunc`] is a func whose arguments are fully resolved, alive for
//! exactly one invocation.

use std::any::Any;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use tracing::trace;

use crate::errors::ResolverError;
use crate::slot::{Slot, SlotKey, TypedSlot};
use crate::value::Value;

type RawFn = Box<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;

/// A wrapped callable: ordered argument slots, one output slot, and
/// optional fixed values appended to every pool it binds against.
pub struct Func {
    name: String,
    args: Vec<Arc<dyn Slot>>,
    output: Arc<dyn Slot>,
    raw: RawFn,
    extra: Vec<Value>,
}

impl Func {
    /// Wrap a typed closure, deriving argument and output slots from its
    /// signature.
    pub fn new<Args, F>(name: impl Into<String>, f: F) -> Func
    where
        F: IntoFunc<Args>,
    {
        Func {
            name: name.into(),
            args: F::arg_slots(),
            output: F::output_slot(),
            raw: f.into_raw(),
            extra: Vec::new(),
        }
    }

    /// Start a builder for slot overrides and fixed values.
    pub fn builder(name: impl Into<String>) -> FuncBuilder {
        FuncBuilder {
            name: name.into(),
            overrides: Vec::new(),
            output_override: None,
            extra: Vec::new(),
        }
    }

    /// Build a func from explicit parts.
    pub fn from_parts(
        name: impl Into<String>,
        args: Vec<Arc<dyn Slot>>,
        output: Arc<dyn Slot>,
        raw: impl Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    ) -> Func {
        Func {
            name: name.into(),
            args,
            output,
            raw: Box::new(raw),
            extra: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared argument slots, in positional order.
    pub fn args(&self) -> &[Arc<dyn Slot>] {
        &self.args
    }

    /// Declared output slot.
    pub fn output(&self) -> &dyn Slot {
        self.output.as_ref()
    }

    fn extended_pool<'p>(&self, pool: &'p [Value]) -> Cow<'p, [Value]> {
        if self.extra.is_empty() {
            Cow::Borrowed(pool)
        } else {
            Cow::Owned(pool.iter().chain(self.extra.iter()).cloned().collect())
        }
    }

    /// Walk declared arguments in order, selecting each from `pool`.
    ///
    /// With a `missing` map, every unmatched slot is recorded against its
    /// positional index and the walk continues, returning `None` at the end
    /// if anything was missing. Without one, the walk fails fast on the
    /// first unmatched slot.
    fn bind(
        &self,
        pool: &[Value],
        mut missing: Option<&mut HashMap<SlotKey, usize>>,
    ) -> Option<Vec<Value>> {
        let mut resolved = Vec::with_capacity(self.args.len());
        let mut complete = true;
        for (idx, slot) in self.args.iter().enumerate() {
            match slot.select(pool) {
                Some(value) => resolved.push(value),
                None => match missing.as_deref_mut() {
                    Some(map) => {
                        map.entry(slot.key()).or_insert(idx);
                        complete = false;
                    }
                    None => return None,
                },
            }
        }
        complete.then_some(resolved)
    }

    /// The argument slots `pool` (plus fixed values) cannot satisfy, keyed
    /// by slot identity, with the first positional index that wants each.
    pub fn missing_args(&self, pool: &[Value]) -> HashMap<SlotKey, usize> {
        let pooled = self.extended_pool(pool);
        let mut missing = HashMap::new();
        self.bind(&pooled, Some(&mut missing));
        missing
    }

    /// Resolve all arguments against `pool` plus this func's fixed values.
    pub fn prepare(&self, pool: &[Value]) -> Option<PreparedFunc<'_>> {
        let pooled = self.extended_pool(pool);
        let args = self.bind(&pooled, None)?;
        Some(PreparedFunc { func: self, args })
    }

    /// Prepare and invoke in one step.
    ///
    /// Fails with [`ResolverError::UnsatisfiedArgs`] when the pool cannot
    /// satisfy the declared arguments; otherwise the callable's own result
    /// (and error, verbatim) is returned.
    pub fn call(&self, pool: &[Value]) -> Result<Value> {
        match self.prepare(pool) {
            Some(prepared) => prepared.invoke(),
            None => {
                let mut named: Vec<(usize, String)> = self
                    .missing_args(pool)
                    .into_iter()
                    .map(|(_, idx)| (idx, self.args[idx].to_string()))
                    .collect();
                named.sort_by_key(|(idx, _)| *idx);
                Err(ResolverError::UnsatisfiedArgs {
                    func: self.name.clone(),
                    missing: named.into_iter().map(|(_, name)| name).collect(),
                }
                .into())
            }
        }
    }
}

impl fmt::Debug for Func {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Func")
            .field("name", &self.name)
            .field("args", &self.args)
            .field("output", &self.output)
            .field("extra", &self.extra.len())
            .finish()
    }
}

impl fmt::Display for Func {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (idx, arg) in self.args.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", arg)?;
        }
        write!(f, ") -> {}", self.output)
    }
}

/// A func plus its fully resolved argument vector; consumed by one
/// invocation.
pub struct PreparedFunc<'f> {
    func: &'f Func,
    args: Vec<Value>,
}

impl PreparedFunc<'_> {
    pub fn func(&self) -> &Func {
        self.func
    }

    /// Invoke the underlying callable with the resolved arguments.
    pub fn invoke(self) -> Result<Value> {
        trace!(func = %self.func.name, args = self.args.len(), "invoking func");
        (self.func.raw)(&self.args)
    }
}

/// Builder for funcs needing per-parameter slot overrides or fixed values.
pub struct FuncBuilder {
    name: String,
    overrides: Vec<(SlotKey, Arc<dyn Slot>)>,
    output_override: Option<Arc<dyn Slot>>,
    extra: Vec<Value>,
}

impl FuncBuilder {
    /// Use `slot` for every parameter whose declared type is exactly `T`.
    pub fn slot_for<T: 'static>(mut self, slot: impl Slot + 'static) -> Self {
        self.overrides.push((SlotKey::of::<T>(), Arc::new(slot)));
        self
    }

    /// Use `slot` as the output slot instead of the derived one.
    pub fn output_slot(mut self, slot: impl Slot + 'static) -> Self {
        self.output_override = Some(Arc::new(slot));
        self
    }

    /// Append a fixed value to every pool this func binds against.
    pub fn with_value(mut self, value: Value) -> Self {
        self.extra.push(value);
        self
    }

    /// Wrap `f`, applying the configured overrides.
    ///
    /// Fails with [`ResolverError::InvalidFunc`] if an override matches no
    /// parameter of `f`.
    pub fn build<Args, F>(self, f: F) -> Result<Func>
    where
        F: IntoFunc<Args>,
    {
        let mut args = F::arg_slots();
        let mut used = vec![false; self.overrides.len()];
        for slot in args.iter_mut() {
            if let Some(pos) = self
                .overrides
                .iter()
                .position(|(key, _)| *key == slot.key())
            {
                *slot = Arc::clone(&self.overrides[pos].1);
                used[pos] = true;
            }
        }
        if let Some(pos) = used.iter().position(|u| !u) {
            return Err(ResolverError::InvalidFunc {
                func: self.name,
                reason: format!(
                    "slot override for {} matches no parameter",
                    self.overrides[pos].1
                ),
            }
            .into());
        }

        let output = self.output_override.unwrap_or_else(F::output_slot);
        Ok(Func {
            name: self.name,
            args,
            output,
            raw: f.into_raw(),
            extra: self.extra,
        })
    }
}

/// A closure parameter the resolver can derive a slot for and extract
/// positionally.
///
/// Blanket-implemented for any `Clone + Send + Sync + 'static` type; the
/// derived slot is [`TypedSlot`].
pub trait FuncArg: Sized + 'static {
    fn slot() -> Arc<dyn Slot>;
    fn extract(value: &Value) -> Option<Self>;
}

impl<T: Clone + Send + Sync + 'static> FuncArg for T {
    fn slot() -> Arc<dyn Slot> {
        Arc::new(TypedSlot::<T>::new())
    }

    fn extract(value: &Value) -> Option<T> {
        value.downcast_ref::<T>().cloned()
    }
}

/// Closures convertible into a [`Func`].
///
/// Implemented for closures of arity 0 through 8 whose parameters implement
/// [`FuncArg`] and whose return type is `anyhow::Result<T>`.
pub trait IntoFunc<Args> {
    fn arg_slots() -> Vec<Arc<dyn Slot>>;
    fn output_slot() -> Arc<dyn Slot>;
    fn into_raw(self) -> RawFn;
}

macro_rules! impl_into_func {
    ($(($ty:ident, $var:ident)),*) => {
        impl<Fun, Out $(, $ty)*> IntoFunc<($($ty,)*)> for Fun
        where
            Fun: Fn($($ty),*) -> Result<Out> + Send + Sync + 'static,
            Out: Any + Send + Sync,
            $($ty: FuncArg,)*
        {
            fn arg_slots() -> Vec<Arc<dyn Slot>> {
                vec![$(<$ty as FuncArg>::slot()),*]
            }

            fn output_slot() -> Arc<dyn Slot> {
                Arc::new(TypedSlot::<Out>::new())
            }

            fn into_raw(self) -> RawFn {
                Box::new(move |args: &[Value]| {
                    let _idx = 0usize;
                    $(
                        let $var = <$ty as FuncArg>::extract(
                            args.get(_idx)
                                .ok_or_else(|| anyhow!("missing argument {}", _idx))?,
                        )
                        .ok_or_else(|| {
                            anyhow!(
                                "argument {} cannot be read as {}",
                                _idx,
                                std::any::type_name::<$ty>()
                            )
                        })?;
                        let _idx = _idx + 1;
                    )*
                    (self)($($var),*).map(Value::new)
                })
            }
        }
    };
}

impl_into_func!();
impl_into_func!((A1, a1));
impl_into_func!((A1, a1), (A2, a2));
impl_into_func!((A1, a1), (A2, a2), (A3, a3));
impl_into_func!((A1, a1), (A2, a2), (A3, a3), (A4, a4));
impl_into_func!((A1, a1), (A2, a2), (A3, a3), (A4, a4), (A5, a5));
impl_into_func!((A1, a1), (A2, a2), (A3, a3), (A4, a4), (A5, a5), (A6, a6));
impl_into_func!(
    (A1, a1),
    (A2, a2),
    (A3, a3),
    (A4, a4),
    (A5, a5),
    (A6, a6),
    (A7, a7)
);
impl_into_func!(
    (A1, a1),
    (A2, a2),
    (A3, a3),
    (A4, a4),
    (A5, a5),
    (A6, a6),
    (A7, a7),
    (A8, a8)
);
