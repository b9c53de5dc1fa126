//! Drydock Resolver
//!
//! Type-directed dependency resolution for plugin function graphs.
//!
//! A plugin host cannot know ahead of time which concrete types a given
//! plugin's functions consume or produce, so mismatched signatures have to
//! be bridged at runtime: a builder's output feeds a registry push, the
//! registry's output feeds a platform deploy, and so on. This crate builds
//! and executes those bridges:
//!
//! - [`Value`]: a tagged payload in the candidate pool, with optional facet
//!   views for abstractly-typed consumers
//! - [`Slot`]: one argument slot - stable identity plus first-match-wins
//!   selection ([`TypedSlot`], [`SetSlot`], or custom impls)
//! - [`Func`]: a wrapped callable with positional slots and one output slot
//! - [`Catalog`]: the immutable registry of candidate mapper funcs
//! - [`Chain`]: an ordered, executable plan whose steps feed each other
//!   through a shared value pool
//! - [`Converter`]: value-to-value and slice conversion on top of chains
//!
//! # Example
//!
//! ```
//! use anyhow::Result;
//! use drydock_resolver::{Catalog, Func, Value};
//!
//! #[derive(Clone)]
//! struct Source(&'static str);
//! #[derive(Clone)]
//! struct Artifact(String);
//!
//! fn main() -> Result<()> {
//!     let catalog = Catalog::builder()
//!         .register(Func::new("build", |src: Source| {
//!             Ok(Artifact(format!("bin:{}", src.0)))
//!         }))
//!         .build();
//!
//!     let deploy = Func::new("deploy", |a: Artifact| Ok(format!("deployed {}", a.0)));
//!
//!     let chain = catalog.chain(&deploy, vec![Value::new(Source("app"))])?;
//!     let result = chain.call()?;
//!     assert_eq!(result.downcast_ref::<String>().unwrap(), "deployed bin:app");
//!     Ok(())
//! }
//! ```
//!
//! Resolution is synchronous and allocates all working state per call;
//! a built [`Catalog`] never mutates, so sharing one across threads for
//! concurrent resolutions is safe without locking.

pub mod catalog;
pub mod chain;
pub mod convert;
pub mod errors;
pub mod func;
pub mod input_set;
pub mod slot;
pub mod value;

pub use catalog::{Catalog, CatalogBuilder};
pub use chain::{Chain, ChainPlan, ChainStepPlan};
pub use convert::Converter;
pub use errors::ResolverError;
pub use func::{Func, FuncArg, FuncBuilder, IntoFunc, PreparedFunc};
pub use slot::{SetSlot, Slot, SlotKey, SlotSet, TypedSlot};
pub use value::Value;
