//! Hierarchical block systems
//!
//! A [`BlockSystem`] treats an ordered list of child blocks, each with its own
//! state vector, as one block whose state is the concatenation of the
//! children's states:
//!
//! ```text
//! x = [ x_0 | x_1 | ... | x_{n-1} ]
//! ```
//!
//! Coupling between children is expressed only in the routing hook, which
//! computes every child's input from the children's states and the system
//! input before the children's derivatives are evaluated.
//!
//! # Example
//!
//! ```
//! use blocksim::block::Block;
//! use blocksim::blocks::{Integrator, StateSpace};
//! use blocksim::system::SystemBuilder;
//!
//! // u -> lag -> integrator
//! let mut system = SystemBuilder::new()
//!     .child(StateSpace::first_order(0.5).unwrap())
//!     .child(Integrator::new(1))
//!     .inputs(1)
//!     .routing(|t, signals, u| {
//!         signals.set_input(0, u);
//!         let lag = signals.eval_output(0, t)[0];
//!         signals.input_mut(1)[0] = lag;
//!     })
//!     .output(1, |t, signals, y| y[0] = signals.eval_output(1, t)[0])
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(system.num_states(), 2);
//! let mut d = [0.0; 2];
//! system.derivative(0.0, &[1.0, 0.0], &[3.0], &mut d);
//! assert_eq!(d, [4.0, 1.0]);
//! ```

mod storage;

use std::collections::TryReserveError;
use std::ops::Range;

use log::debug;
use thiserror::Error;

use crate::block::{Block, Observation};

pub use storage::{CompositeStorage, StorageError};

/// Routing hook: populate every child input from child states and system input
pub type RoutingFn<'a> = Box<dyn FnMut(f64, &mut Signals<'_, 'a>, &[f64]) + 'a>;

/// System output hook: `y = h(t, child signals)`
pub type SystemOutputFn<'a> = Box<dyn FnMut(f64, &mut Signals<'_, 'a>, &mut [f64]) + 'a>;

/// System utility hook, called once per step with the aggregate vectors
pub type SystemUtilityFn<'a> = Box<dyn FnMut(&Observation<'_>, &mut Signals<'_, 'a>) + 'a>;

/// Errors raised while composing a system
#[derive(Error, Debug)]
pub enum CompositionError {
    #[error("A block system needs at least one child")]
    NoChildren,

    #[error("Child {index} has no states")]
    StatelessChild { index: usize },

    #[error("No routing function was provided")]
    MissingRouting,

    #[error("Total state size overflows usize at child {index}")]
    StateOverflow { index: usize },

    #[error("Failed to allocate the state layout")]
    Allocation(#[from] TryReserveError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Offsets of each child's states inside the aggregate state vector
///
/// Computed once at composition time and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateLayout {
    ranges: Vec<Range<usize>>,
    num_states: usize,
}

impl StateLayout {
    /// Lay out children back to back in child order
    ///
    /// Fails if there are no children, a child has no states, or the total
    /// state count does not fit in usize.
    pub fn new<B: Block>(children: &[B]) -> Result<Self, CompositionError> {
        if children.is_empty() {
            return Err(CompositionError::NoChildren);
        }

        let mut ranges = Vec::new();
        ranges.try_reserve_exact(children.len())?;

        let mut offset: usize = 0;
        for (index, child) in children.iter().enumerate() {
            let n = child.num_states();
            if n == 0 {
                return Err(CompositionError::StatelessChild { index });
            }
            let end = offset
                .checked_add(n)
                .ok_or(CompositionError::StateOverflow { index })?;
            ranges.push(offset..end);
            offset = end;
        }

        Ok(Self {
            ranges,
            num_states: offset,
        })
    }

    /// Sum of the children's state counts
    pub fn num_states(&self) -> usize {
        self.num_states
    }

    pub fn num_children(&self) -> usize {
        self.ranges.len()
    }

    /// State range of child `index`
    #[inline]
    pub fn range(&self, index: usize) -> Range<usize> {
        self.ranges[index].clone()
    }

    /// View of child `index`'s states inside an aggregate state vector
    #[inline]
    pub fn view<'x>(&self, state: &'x [f64], index: usize) -> &'x [f64] {
        &state[self.range(index)]
    }

    pub fn ranges(&self) -> &[Range<usize>] {
        &self.ranges
    }
}

/// Child signals seen by the routing, output and utility hooks
///
/// Gives read access to each child's state view and read/write access to the
/// child input and output vectors held by the system's [`CompositeStorage`].
pub struct Signals<'s, 'a> {
    children: &'s mut [Box<dyn Block + 'a>],
    layout: &'s StateLayout,
    storage: &'s mut CompositeStorage,
    state: &'s [f64],
}

impl<'s, 'a> Signals<'s, 'a> {
    fn new(
        children: &'s mut [Box<dyn Block + 'a>],
        layout: &'s StateLayout,
        storage: &'s mut CompositeStorage,
        state: &'s [f64],
    ) -> Self {
        Self {
            children,
            layout,
            storage,
            state,
        }
    }

    pub fn num_children(&self) -> usize {
        self.children.len()
    }

    pub fn child(&self, index: usize) -> &dyn Block {
        &*self.children[index]
    }

    /// State view of child `index`
    #[inline]
    pub fn state(&self, index: usize) -> &[f64] {
        self.layout.view(self.state, index)
    }

    /// Aggregate state vector
    pub fn system_state(&self) -> &[f64] {
        self.state
    }

    #[inline]
    pub fn input(&self, index: usize) -> &[f64] {
        self.storage.input(index)
    }

    #[inline]
    pub fn input_mut(&mut self, index: usize) -> &mut [f64] {
        self.storage.input_mut(index)
    }

    /// Copy `values` into child `index`'s input vector
    ///
    /// # Panics
    ///
    /// Panics if `values` does not have the child's input length.
    #[inline]
    pub fn set_input(&mut self, index: usize, values: &[f64]) {
        self.storage.input_mut(index).copy_from_slice(values);
    }

    /// Last output written for child `index`
    #[inline]
    pub fn output(&self, index: usize) -> &[f64] {
        self.storage.output(index)
    }

    /// Evaluate child `index`'s output function at its current state
    pub fn eval_output(&mut self, index: usize, t: f64) -> &[f64] {
        let state = self.layout.view(self.state, index);
        self.children[index].output(t, state, self.storage.output_mut(index));
        self.storage.output(index)
    }

    /// Evaluate every child's output function in child order
    pub fn eval_outputs(&mut self, t: f64) {
        for index in 0..self.children.len() {
            self.eval_output(index, t);
        }
    }
}

/// Composite block built from child blocks and a routing hook
///
/// Children may be owned (`Box<dyn Block>`, concrete blocks) or borrowed
/// (`&mut B`) for the lifetime `'a`.
pub struct BlockSystem<'a> {
    children: Vec<Box<dyn Block + 'a>>,
    layout: StateLayout,
    storage: CompositeStorage,
    num_inputs: usize,
    num_outputs: usize,
    routing_fn: RoutingFn<'a>,
    output_fn: Option<SystemOutputFn<'a>>,
    utility_fn: Option<SystemUtilityFn<'a>>,
}

impl<'a> BlockSystem<'a> {
    /// Start building a system
    pub fn builder() -> SystemBuilder<'a> {
        SystemBuilder::new()
    }

    pub fn num_children(&self) -> usize {
        self.children.len()
    }

    pub fn child(&self, index: usize) -> &dyn Block {
        &*self.children[index]
    }

    pub fn layout(&self) -> &StateLayout {
        &self.layout
    }

    pub fn storage(&self) -> &CompositeStorage {
        &self.storage
    }
}

impl Block for BlockSystem<'_> {
    fn num_states(&self) -> usize {
        self.layout.num_states()
    }

    fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    fn num_outputs(&self) -> usize {
        self.num_outputs
    }

    fn output(&mut self, t: f64, state: &[f64], output: &mut [f64]) {
        let Self {
            children,
            layout,
            storage,
            output_fn,
            ..
        } = self;
        if let Some(output_fn) = output_fn {
            let mut signals = Signals::new(children, layout, storage, state);
            output_fn(t, &mut signals, output);
        }
    }

    fn derivative(&mut self, t: f64, state: &[f64], input: &[f64], d_state: &mut [f64]) {
        let Self {
            children,
            layout,
            storage,
            routing_fn,
            ..
        } = self;

        {
            let mut signals = Signals::new(children, layout, storage, state);
            routing_fn(t, &mut signals, input);
        }

        for (index, child) in children.iter_mut().enumerate() {
            let range = layout.range(index);
            child.derivative(t, &state[range.clone()], storage.input(index), &mut d_state[range]);
        }
    }

    fn observe(&mut self, observation: &Observation<'_>) {
        let Self {
            children,
            layout,
            storage,
            utility_fn,
            ..
        } = self;
        if let Some(utility_fn) = utility_fn {
            let mut signals = Signals::new(children, layout, storage, observation.state);
            utility_fn(observation, &mut signals);
        }
    }

    fn has_output(&self) -> bool {
        self.output_fn.is_some()
    }
}

/// Builder for [`BlockSystem`]
pub struct SystemBuilder<'a> {
    children: Vec<Box<dyn Block + 'a>>,
    num_inputs: usize,
    num_outputs: usize,
    routing_fn: Option<RoutingFn<'a>>,
    output_fn: Option<SystemOutputFn<'a>>,
    utility_fn: Option<SystemUtilityFn<'a>>,
}

impl Default for SystemBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> SystemBuilder<'a> {
    pub fn new() -> Self {
        Self {
            children: Vec::new(),
            num_inputs: 0,
            num_outputs: 0,
            routing_fn: None,
            output_fn: None,
            utility_fn: None,
        }
    }

    /// Append a child; its states follow those of the previous children
    pub fn child<B: Block + 'a>(mut self, block: B) -> Self {
        self.children.push(Box::new(block));
        self
    }

    /// Append already boxed children
    pub fn children<I>(mut self, blocks: I) -> Self
    where
        I: IntoIterator<Item = Box<dyn Block + 'a>>,
    {
        self.children.extend(blocks);
        self
    }

    /// Length of the system input vector
    pub fn inputs(mut self, num_inputs: usize) -> Self {
        self.num_inputs = num_inputs;
        self
    }

    /// Set the routing hook
    ///
    /// Called at the start of every derivative evaluation. It must fill every
    /// child input vector before returning.
    pub fn routing<F>(mut self, routing: F) -> Self
    where
        F: FnMut(f64, &mut Signals<'_, 'a>, &[f64]) + 'a,
    {
        self.routing_fn = Some(Box::new(routing));
        self
    }

    /// Set the system output hook and the system output length
    pub fn output<F>(mut self, num_outputs: usize, output: F) -> Self
    where
        F: FnMut(f64, &mut Signals<'_, 'a>, &mut [f64]) + 'a,
    {
        self.num_outputs = num_outputs;
        self.output_fn = Some(Box::new(output));
        self
    }

    /// Set the system utility hook
    pub fn utility<F>(mut self, utility: F) -> Self
    where
        F: FnMut(&Observation<'_>, &mut Signals<'_, 'a>) + 'a,
    {
        self.utility_fn = Some(Box::new(utility));
        self
    }

    /// Validate the children and allocate the system storage
    ///
    /// Fails without building anything if there are no children, a child has
    /// no states, no routing hook was set, or storage cannot be allocated.
    pub fn build(self) -> Result<BlockSystem<'a>, CompositionError> {
        let layout = StateLayout::new(&self.children)?;
        let routing_fn = self.routing_fn.ok_or(CompositionError::MissingRouting)?;
        let storage = CompositeStorage::allocate(&self.children)?;

        debug!(
            "composed block system: {} children, {} states, {} storage values",
            self.children.len(),
            layout.num_states(),
            storage.len()
        );

        Ok(BlockSystem {
            children: self.children,
            layout,
            storage,
            num_inputs: self.num_inputs,
            num_outputs: self.num_outputs,
            routing_fn,
            output_fn: self.output_fn,
            utility_fn: self.utility_fn,
        })
    }
}
