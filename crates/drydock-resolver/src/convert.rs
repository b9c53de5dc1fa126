//! Bulk conversion built on top of chain resolution.
//!
//! A [`Converter`] wraps a catalog and turns "get me a `T` out of this
//! value" into a one-shot resolution: build a chain targeting `T`, seed it
//! with the input, execute, downcast.

use std::any::Any;

use anyhow::Result;
use tracing::debug;

use crate::catalog::Catalog;
use crate::errors::ResolverError;
use crate::func::Func;
use crate::value::Value;

/// Value-to-value and slice conversion through a mapper catalog.
pub struct Converter {
    catalog: Catalog,
}

impl Converter {
    pub fn new(catalog: Catalog) -> Self {
        Converter { catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Convert `input` into an `Out` by resolving and executing a chain
    /// targeting `Out`.
    ///
    /// Fails when no chain can be built for `Out`, or when a mapper along
    /// the chain fails (its error is returned unmodified).
    pub fn convert<Out>(&self, input: Value) -> Result<Out>
    where
        Out: Clone + Send + Sync + Any,
    {
        let target = Func::new(std::any::type_name::<Out>(), |out: Out| Ok(out));
        let chain = self.catalog.chain(&target, vec![input])?;
        debug!(
            out = std::any::type_name::<Out>(),
            steps = chain.len(),
            "conversion chain resolved"
        );
        let value = chain.call()?;
        value
            .downcast_ref::<Out>()
            .cloned()
            .ok_or_else(|| {
                ResolverError::OutputMismatch {
                    expected: std::any::type_name::<Out>(),
                    got: value.type_name(),
                }
                .into()
            })
    }

    /// Convert every element, preserving order; fails fast on the first
    /// element no chain can be built or executed for.
    pub fn convert_slice<Out>(&self, inputs: impl IntoIterator<Item = Value>) -> Result<Vec<Out>>
    where
        Out: Clone + Send + Sync + Any,
    {
        let mut converted = Vec::new();
        for input in inputs {
            converted.push(self.convert::<Out>(input)?);
        }
        Ok(converted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Region(String);

    fn converter() -> Converter {
        Converter::new(
            Catalog::builder()
                .register(Func::new("region-of", |name: String| Ok(Region(name))))
                .register(Func::new("stringify", |n: i32| Ok(n.to_string())))
                .build(),
        )
    }

    #[test]
    fn test_convert_direct() {
        let set = converter();
        let region: Region = set
            .convert(Value::new("us-east-1".to_string()))
            .expect("one-step conversion");
        assert_eq!(region, Region("us-east-1".to_string()));
    }

    #[test]
    fn test_convert_through_intermediate() {
        let set = converter();
        // i32 -> String -> Region
        let region: Region = set.convert(Value::new(7_i32)).expect("two-step conversion");
        assert_eq!(region, Region("7".to_string()));
    }

    #[test]
    fn test_convert_identity() {
        let set = converter();
        let region: Region = set
            .convert(Value::new(Region("eu-west-2".to_string())))
            .expect("already the target type");
        assert_eq!(region, Region("eu-west-2".to_string()));
    }

    #[test]
    fn test_convert_unmappable() {
        let set = converter();
        let err = set
            .convert::<Region>(Value::new(3.5_f64))
            .expect_err("no chain from f64");
        assert!(err.to_string().contains("unable to map to"), "got: {}", err);
    }

    #[test]
    fn test_convert_slice_preserves_order() {
        let set = converter();
        let inputs = vec![Value::new(1_i32), Value::new(2_i32), Value::new(3_i32)];
        let regions: Vec<Region> = set.convert_slice(inputs).expect("all convert");
        let names: Vec<&str> = regions.iter().map(|r| r.0.as_str()).collect();
        assert_eq!(names, ["1", "2", "3"]);
    }

    #[test]
    fn test_convert_slice_fails_fast() {
        let set = converter();
        let inputs = vec![
            Value::new(1_i32),
            Value::new(3.5_f64),
            Value::new(2_i32),
        ];
        let err = set
            .convert_slice::<Region>(inputs)
            .expect_err("second element unconvertible");
        assert!(err.to_string().contains("unable to map to"), "got: {}", err);
    }
}
