//! General ODE block

use crate::block::{output_state, Block};

/// General ODE block: dx/dt = f(t, x, u), y = x
///
/// # Type Parameters
///
/// - `F`: Dynamics function with signature `fn(t, state, inputs, derivatives)`
///
/// # Example
///
/// ```
/// use blocksim::block::Block;
/// use blocksim::blocks::Ode;
///
/// // Harmonic oscillator: d²x/dt² = -k*x - c*dx/dt
/// // State: [position, velocity]
/// let mut ode = Ode::new(2, |_t, state, _inputs, derivs| {
///     let k = 1.0; // Spring constant
///     let c = 0.1; // Damping
///     derivs[0] = state[1];
///     derivs[1] = -k * state[0] - c * state[1];
/// });
///
/// let mut d = [0.0; 2];
/// ode.derivative(0.0, &[1.0, 0.0], &[], &mut d);
/// assert_eq!(d, [0.0, -1.0]);
/// ```
#[derive(Clone)]
pub struct Ode<F>
where
    F: FnMut(f64, &[f64], &[f64], &mut [f64]),
{
    num_states: usize,
    num_inputs: usize,
    dynamics: F,
}

impl<F> Ode<F>
where
    F: FnMut(f64, &[f64], &[f64], &mut [f64]),
{
    /// Create an autonomous ODE block with `num_states` states and no inputs
    pub fn new(num_states: usize, dynamics: F) -> Self {
        Self::with_inputs(num_states, 0, dynamics)
    }

    /// Create an ODE block with `num_inputs` input ports
    pub fn with_inputs(num_states: usize, num_inputs: usize, dynamics: F) -> Self {
        Self {
            num_states,
            num_inputs,
            dynamics,
        }
    }
}

impl<F> Block for Ode<F>
where
    F: FnMut(f64, &[f64], &[f64], &mut [f64]),
{
    fn num_states(&self) -> usize {
        self.num_states
    }

    fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    fn num_outputs(&self) -> usize {
        self.num_states
    }

    #[inline]
    fn output(&mut self, _t: f64, state: &[f64], output: &mut [f64]) {
        output_state(state, output);
    }

    #[inline]
    fn derivative(&mut self, t: f64, state: &[f64], input: &[f64], d_state: &mut [f64]) {
        (self.dynamics)(t, state, input, d_state);
    }
}
