//! Structured error types for func construction, chain resolution, and
//! chain execution.
//!
//! Public APIs return `anyhow::Result`; these variants travel inside the
//! `anyhow::Error` so callers can downcast and branch programmatically.
//! Errors returned by a step's own callable are propagated verbatim and
//! never wrapped in one of these.

/// Errors produced by the resolver core itself.
#[derive(Debug, Clone)]
pub enum ResolverError {
    /// A func could not be constructed from the pieces given to the builder.
    InvalidFunc {
        /// Name of the func being built
        func: String,
        /// What was wrong with it
        reason: String,
    },

    /// No registered producer chain can supply a required slot.
    ///
    /// This is also the shape a dependency cycle surfaces as: a slot whose
    /// only producers were already on the resolution stack has no usable
    /// candidate left.
    Unmappable {
        /// Diagnostic name of the slot that could not be produced
        slot: String,
        /// The func that required it
        func: String,
    },

    /// A func was called with a value pool that does not satisfy its
    /// declared arguments.
    UnsatisfiedArgs {
        /// Name of the func that was called
        func: String,
        /// Diagnostic names of the unmatched argument slots, in positional order
        missing: Vec<String>,
    },

    /// A resolved chain produced a value of an unexpected type.
    OutputMismatch {
        /// The type the caller asked for
        expected: &'static str,
        /// The type the chain actually produced
        got: &'static str,
    },
}

impl std::fmt::Display for ResolverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolverError::InvalidFunc { func, reason } => {
                write!(f, "invalid func {}: {}", func, reason)
            }
            ResolverError::Unmappable { slot, func } => {
                write!(f, "unable to map to {} (required by {})", slot, func)
            }
            ResolverError::UnsatisfiedArgs { func, missing } => {
                write!(
                    f,
                    "unsatisfied arguments for {}: {}",
                    func,
                    missing.join(", ")
                )
            }
            ResolverError::OutputMismatch { expected, got } => {
                write!(f, "chain produced {}, expected {}", got, expected)
            }
        }
    }
}

impl std::error::Error for ResolverError {}
