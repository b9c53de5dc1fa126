//! Pool values - the tagged payloads that seeds and intermediate results
//! travel as.
//!
//! A [`Value`] pairs a payload with the key of its concrete type, plus an
//! optional list of *facet* views: alternate typed payloads (typically
//! `Arc<dyn Trait>` handles) registered under their own keys. Facets let a
//! concrete value satisfy an abstractly-typed argument slot without any
//! runtime reflection - the value declares up front which views it can be
//! used through, and matching stays a key comparison.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::slot::SlotKey;

type Payload = Arc<dyn Any + Send + Sync>;

#[derive(Clone)]
struct Facet {
    key: SlotKey,
    name: &'static str,
    payload: Payload,
}

/// One entry in a candidate value pool.
///
/// Cheap to clone: the payload is reference-counted.
#[derive(Clone)]
pub struct Value {
    key: SlotKey,
    name: &'static str,
    payload: Payload,
    facets: SmallVec<[Facet; 2]>,
}

impl Value {
    /// Wrap a concrete value, keyed by its type.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Value {
            key: SlotKey::of::<T>(),
            name: std::any::type_name::<T>(),
            payload: Arc::new(value),
            facets: SmallVec::new(),
        }
    }

    /// Attach a facet view: an alternate typed payload this value can be
    /// selected as.
    ///
    /// The canonical use is advertising a trait-object handle for a concrete
    /// plugin component:
    ///
    /// ```ignore
    /// let registry: Arc<dyn Registry> = Arc::new(local);
    /// let value = Value::new(local_config).with_facet(registry);
    /// ```
    pub fn with_facet<F: Any + Send + Sync>(mut self, facet: F) -> Self {
        self.facets.push(Facet {
            key: SlotKey::of::<F>(),
            name: std::any::type_name::<F>(),
            payload: Arc::new(facet),
        });
        self
    }

    /// Key of the concrete payload type.
    pub fn key(&self) -> SlotKey {
        self.key
    }

    /// Diagnostic name of the concrete payload type.
    pub fn type_name(&self) -> &'static str {
        self.name
    }

    /// Whether this value can be selected under `key`, either as its
    /// concrete type or through a facet.
    pub fn satisfies(&self, key: &SlotKey) -> bool {
        self.key == *key || self.facets.iter().any(|f| f.key == *key)
    }

    /// Extract the payload this value carries for `key`, if any.
    ///
    /// Returns a standalone [`Value`] keyed by `key`: the concrete payload
    /// when keys match directly, or the facet payload for an advertised view.
    pub fn view(&self, key: &SlotKey) -> Option<Value> {
        if self.key == *key {
            return Some(Value {
                key: self.key,
                name: self.name,
                payload: self.payload.clone(),
                facets: SmallVec::new(),
            });
        }
        self.facets.iter().find(|f| f.key == *key).map(|f| Value {
            key: f.key,
            name: f.name,
            payload: f.payload.clone(),
            facets: SmallVec::new(),
        })
    }

    /// Borrow the concrete payload as `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("Value");
        d.field("type", &self.name);
        if !self.facets.is_empty() {
            let names: Vec<&str> = self.facets.iter().map(|x| x.name).collect();
            d.field("facets", &names);
        }
        d.finish()
    }
}
