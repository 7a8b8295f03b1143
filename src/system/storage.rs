//! Backing store for the per-child input and output vectors of a system
//!
//! All child inputs and outputs live in one contiguous buffer:
//!
//! ```text
//! [ in_0 | in_1 | ... | in_{n-1} | out_0 | out_1 | ... | out_{n-1} ]
//! ```
//!
//! Children only ever see slices computed from the offset tables, so the
//! buffer has exactly one owner and is released exactly once on drop.

use std::collections::TryReserveError;
use std::ops::Range;

use log::trace;
use thiserror::Error;

use crate::block::Block;

/// Storage allocation errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to allocate composite storage")]
    Allocation(#[from] TryReserveError),

    #[error("Total child {what} size overflows usize")]
    Overflow { what: &'static str },
}

/// Sum of `size` over `children`, or `Overflow` if it does not fit in usize
fn total_size<B: Block>(
    children: &[B],
    what: &'static str,
    size: impl Fn(&B) -> usize,
) -> Result<usize, StorageError> {
    children
        .iter()
        .try_fold(0usize, |acc, child| acc.checked_add(size(child)))
        .ok_or(StorageError::Overflow { what })
}

/// Contiguous input/output storage for the children of a system
#[derive(Debug, Clone)]
pub struct CompositeStorage {
    buffer: Vec<f64>,
    inputs: Vec<Range<usize>>,
    outputs: Vec<Range<usize>>,
}

impl CompositeStorage {
    /// Allocate zeroed input and output vectors for `children`, in child order
    ///
    /// Nothing is kept if any allocation fails or the sizes overflow.
    pub fn allocate<B: Block>(children: &[B]) -> Result<Self, StorageError> {
        let total_inputs = total_size(children, "input", Block::num_inputs)?;
        let total_outputs = total_size(children, "output", Block::num_outputs)?;
        let total = total_inputs
            .checked_add(total_outputs)
            .ok_or(StorageError::Overflow { what: "input and output" })?;

        let mut buffer = Vec::new();
        buffer.try_reserve_exact(total)?;
        let mut inputs = Vec::new();
        inputs.try_reserve_exact(children.len())?;
        let mut outputs = Vec::new();
        outputs.try_reserve_exact(children.len())?;

        buffer.resize(total, 0.0);

        // Partial sums never exceed the checked totals
        let mut input_offset = 0;
        let mut output_offset = total_inputs;
        for child in children {
            inputs.push(input_offset..input_offset + child.num_inputs());
            outputs.push(output_offset..output_offset + child.num_outputs());
            input_offset += child.num_inputs();
            output_offset += child.num_outputs();
        }

        trace!(
            "allocated composite storage: {} children, {total_inputs} inputs, {total_outputs} outputs",
            children.len()
        );

        Ok(Self {
            buffer,
            inputs,
            outputs,
        })
    }

    pub fn num_children(&self) -> usize {
        self.inputs.len()
    }

    /// Length of the backing buffer (all inputs plus all outputs)
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Offset range of child `index`'s input vector in the backing buffer
    pub fn input_range(&self, index: usize) -> Range<usize> {
        self.inputs[index].clone()
    }

    /// Offset range of child `index`'s output vector in the backing buffer
    pub fn output_range(&self, index: usize) -> Range<usize> {
        self.outputs[index].clone()
    }

    #[inline]
    pub fn input(&self, index: usize) -> &[f64] {
        &self.buffer[self.inputs[index].clone()]
    }

    #[inline]
    pub fn input_mut(&mut self, index: usize) -> &mut [f64] {
        &mut self.buffer[self.inputs[index].clone()]
    }

    #[inline]
    pub fn output(&self, index: usize) -> &[f64] {
        &self.buffer[self.outputs[index].clone()]
    }

    #[inline]
    pub fn output_mut(&mut self, index: usize) -> &mut [f64] {
        &mut self.buffer[self.outputs[index].clone()]
    }

    /// Whole backing buffer
    pub fn as_slice(&self) -> &[f64] {
        &self.buffer
    }
}
