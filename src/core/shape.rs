//! Flatten / unflatten of nested field batches
//!
//! A field fetcher may answer each parent with a list (or a list of lists)
//! of values. To resolve the next level in one call, the executor flattens
//! the whole batch into its leaves, remembering where every list started
//! and ended, then rebuilds the original nesting around the resolved leaves.

use crate::core::error::FetchError;
use crate::core::value::Value;

/// Nesting recorded for one value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    Leaf,
    List(Vec<Shape>),
}

impl Shape {
    /// Number of leaves under this shape
    pub fn leaf_count(&self) -> usize {
        match self {
            Shape::Leaf => 1,
            Shape::List(children) => children.iter().map(Shape::leaf_count).sum(),
        }
    }
}

/// Flatten one value, pushing its leaves onto `out` in order
pub fn flatten_value(value: Value, out: &mut Vec<Value>) -> Shape {
    match value {
        Value::List(items) => Shape::List(
            items
                .into_iter()
                .map(|item| flatten_value(item, out))
                .collect(),
        ),
        leaf => {
            out.push(leaf);
            Shape::Leaf
        }
    }
}

/// Flatten a batch, returning one shape per input value and all leaves in order
pub fn flatten(values: Vec<Value>) -> (Vec<Shape>, Vec<Value>) {
    let mut leaves = Vec::new();
    let shapes = values
        .into_iter()
        .map(|value| flatten_value(value, &mut leaves))
        .collect();

    (shapes, leaves)
}

/// Rebuild the batch described by `shapes`, substituting `flat` for its leaves
///
/// `flat` must hold exactly as many items as the shapes have leaves.
pub fn unflatten(shapes: &[Shape], flat: Vec<Value>) -> Result<Vec<Value>, FetchError> {
    let expected: usize = shapes.iter().map(Shape::leaf_count).sum();
    if expected != flat.len() {
        return Err(FetchError::ShapeMismatch {
            expected,
            actual: flat.len(),
        });
    }

    let mut items = flat.into_iter();
    shapes
        .iter()
        .map(|shape| rebuild(shape, &mut items, expected))
        .collect()
}

fn rebuild(
    shape: &Shape,
    items: &mut impl Iterator<Item = Value>,
    expected: usize,
) -> Result<Value, FetchError> {
    match shape {
        Shape::Leaf => items.next().ok_or(FetchError::ShapeMismatch {
            expected,
            actual: 0,
        }),
        Shape::List(children) => children
            .iter()
            .map(|child| rebuild(child, &mut *items, expected))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
    }
}
