//! Argument slots - how a func describes what it accepts.
//!
//! A [`Slot`] stands for one positional argument: a stable identity used for
//! indexing and memoization, and a selection rule that picks the first
//! satisfying value out of a candidate pool. Two slots are interchangeable
//! exactly when their keys are equal.
//!
//! Built-in variants:
//! - [`TypedSlot`]: matches by exact concrete type, or through a facet view
//!   a value has advertised. This is what typed closure parameters derive to.
//! - [`SetSlot`]: satisfied only once several distinct values collectively
//!   cover an expected key set; used for dynamic, variable-arity plugin
//!   arguments.
//!
//! Hosts with needs beyond these implement [`Slot`] themselves; the resolver
//! only ever goes through the trait.

use std::any::TypeId;
use std::fmt;
use std::marker::PhantomData;

use crate::value::Value;

/// Stable, comparable identity of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKey {
    /// Identity of a concrete Rust type.
    Type(TypeId),
    /// Identity of a custom matcher, by name.
    Custom(&'static str),
}

impl SlotKey {
    /// Key for the concrete type `T`.
    pub fn of<T: 'static>() -> Self {
        SlotKey::Type(TypeId::of::<T>())
    }

    /// Key for a custom matcher.
    pub fn custom(name: &'static str) -> Self {
        SlotKey::Custom(name)
    }
}

/// One argument slot of a func.
///
/// Implementations must keep `key` stable across calls for the same logical
/// slot, and `select` must honor first-match-wins over the pool order; there
/// is no best-match notion anywhere in the resolver.
pub trait Slot: fmt::Debug + fmt::Display + Send + Sync {
    /// Stable identity used for producer indexing and memoization.
    fn key(&self) -> SlotKey;

    /// Pick the first value in `pool` order that satisfies this slot.
    fn select(&self, pool: &[Value]) -> Option<Value>;
}

/// Default slot: matches a value whose concrete type is `T`, or one that
/// advertises a facet view keyed by `T`.
pub struct TypedSlot<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T: 'static> TypedSlot<T> {
    pub fn new() -> Self {
        TypedSlot {
            name: std::any::type_name::<T>(),
            _marker: PhantomData,
        }
    }
}

impl<T: 'static> Default for TypedSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Slot for TypedSlot<T> {
    fn key(&self) -> SlotKey {
        SlotKey::of::<T>()
    }

    fn select(&self, pool: &[Value]) -> Option<Value> {
        let key = self.key();
        pool.iter().find_map(|v| v.view(&key))
    }
}

impl<T> fmt::Debug for TypedSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypedSlot({})", self.name)
    }
}

impl<T> fmt::Display for TypedSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// The bundle a [`SetSlot`] selection produces: the covering values in
/// expected-key order.
#[derive(Clone, Debug)]
pub struct SlotSet {
    values: Vec<Value>,
}

impl SlotSet {
    /// The covering values, one per expected key, in expected-key order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Set-completion slot: satisfied only when every expected key is covered by
/// some value in the pool.
///
/// Selection yields a [`SlotSet`] bundling the first covering value for each
/// expected key. Declare the consuming parameter as `SlotSet` and attach
/// this slot through a builder override.
pub struct SetSlot {
    name: &'static str,
    expected: Vec<SlotKey>,
}

impl SetSlot {
    /// A set-completion slot identified by `name`, requiring every key in
    /// `expected` to be covered.
    pub fn new(name: &'static str, expected: Vec<SlotKey>) -> Self {
        SetSlot { name, expected }
    }

    /// The keys this slot requires covered.
    pub fn expected(&self) -> &[SlotKey] {
        &self.expected
    }
}

impl Slot for SetSlot {
    fn key(&self) -> SlotKey {
        SlotKey::Custom(self.name)
    }

    fn select(&self, pool: &[Value]) -> Option<Value> {
        let mut covering = Vec::with_capacity(self.expected.len());
        for key in &self.expected {
            covering.push(pool.iter().find_map(|v| v.view(key))?);
        }
        Some(Value::new(SlotSet { values: covering }))
    }
}

impl fmt::Debug for SetSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SetSlot({}, {} keys)", self.name, self.expected.len())
    }
}

impl fmt::Display for SetSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
