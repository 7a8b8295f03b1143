//! Core Block trait
//!
//! A block maps time, state and input to a state derivative and an output.
//! The block itself never owns the state vector: every numeric buffer is
//! supplied by the caller, so the same block can be reused across independent
//! runs and nested inside a [`BlockSystem`](crate::system::BlockSystem).

/// Arguments handed to [`Block::observe`] once per step
///
/// All vectors are views into caller-owned buffers and are read-only.
#[derive(Debug, Clone, Copy)]
pub struct Observation<'a> {
    pub time: f64,
    pub d_state: &'a [f64],
    pub state: &'a [f64],
    pub input: &'a [f64],
    pub output: &'a [f64],
}

/// Strictly proper block: `y = h(t, x)`, `dx/dt = f(t, x, u)`
///
/// # Design
///
/// - Sizes are reported at runtime so blocks can be composed into systems
///   whose dimensions are only known once the children are chosen
/// - `output` is the `h` function, `derivative` is the `f` function
/// - `observe` is an optional side-effect hook evaluated after `h` and `f`
///
/// # Example
///
/// ```
/// use blocksim::block::{output_state, Block};
///
/// /// Exponential decay: dx/dt = -k*x
/// struct Decay {
///     k: f64,
/// }
///
/// impl Block for Decay {
///     fn num_states(&self) -> usize { 1 }
///     fn num_inputs(&self) -> usize { 0 }
///     fn num_outputs(&self) -> usize { 1 }
///
///     fn output(&mut self, _t: f64, state: &[f64], output: &mut [f64]) {
///         output_state(state, output);
///     }
///
///     fn derivative(&mut self, _t: f64, state: &[f64], _input: &[f64], d_state: &mut [f64]) {
///         d_state[0] = -self.k * state[0];
///     }
/// }
///
/// let mut decay = Decay { k: 2.0 };
/// let mut d = [0.0];
/// decay.derivative(0.0, &[3.0], &[], &mut d);
/// assert_eq!(d[0], -6.0);
/// ```
pub trait Block {
    /// Length of the state vector
    fn num_states(&self) -> usize;

    /// Length of the input vector
    fn num_inputs(&self) -> usize;

    /// Length of the output vector
    fn num_outputs(&self) -> usize;

    /// Evaluate `output = h(t, state)`
    fn output(&mut self, t: f64, state: &[f64], output: &mut [f64]);

    /// Evaluate `d_state = f(t, state, input)`
    fn derivative(&mut self, t: f64, state: &[f64], input: &[f64], d_state: &mut [f64]);

    /// Side-effect hook, called once per step after `output` and `derivative`
    ///
    /// Default implementation does nothing.
    fn observe(&mut self, _observation: &Observation<'_>) {}

    /// Returns false when the block cannot produce an output yet
    ///
    /// Only composite systems built without an output hook report false.
    /// Trajectory drivers refuse to run such blocks.
    fn has_output(&self) -> bool {
        true
    }
}

/// Common output function: copy the state into the output
///
/// Copies `min(state.len(), output.len())` values.
#[inline]
pub fn output_state(state: &[f64], output: &mut [f64]) {
    let n = state.len().min(output.len());
    output[..n].copy_from_slice(&state[..n]);
}

impl<B: Block + ?Sized> Block for Box<B> {
    fn num_states(&self) -> usize {
        (**self).num_states()
    }

    fn num_inputs(&self) -> usize {
        (**self).num_inputs()
    }

    fn num_outputs(&self) -> usize {
        (**self).num_outputs()
    }

    #[inline]
    fn output(&mut self, t: f64, state: &[f64], output: &mut [f64]) {
        (**self).output(t, state, output)
    }

    #[inline]
    fn derivative(&mut self, t: f64, state: &[f64], input: &[f64], d_state: &mut [f64]) {
        (**self).derivative(t, state, input, d_state)
    }

    fn observe(&mut self, observation: &Observation<'_>) {
        (**self).observe(observation)
    }

    fn has_output(&self) -> bool {
        (**self).has_output()
    }
}

impl<B: Block + ?Sized> Block for &mut B {
    fn num_states(&self) -> usize {
        (**self).num_states()
    }

    fn num_inputs(&self) -> usize {
        (**self).num_inputs()
    }

    fn num_outputs(&self) -> usize {
        (**self).num_outputs()
    }

    #[inline]
    fn output(&mut self, t: f64, state: &[f64], output: &mut [f64]) {
        (**self).output(t, state, output)
    }

    #[inline]
    fn derivative(&mut self, t: f64, state: &[f64], input: &[f64], d_state: &mut [f64]) {
        (**self).derivative(t, state, input, d_state)
    }

    fn observe(&mut self, observation: &Observation<'_>) {
        (**self).observe(observation)
    }

    fn has_output(&self) -> bool {
        (**self).has_output()
    }
}
