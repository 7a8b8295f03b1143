//! Integrator block: dy/dt = u

use crate::block::{output_state, Block};

/// Integrator: dx/dt = u, y = x
///
/// A bank of `width` independent integrators. States, inputs and outputs all
/// have length `width`.
///
/// # Example
///
/// ```
/// use blocksim::blocks::Integrator;
/// use blocksim::simulation::simulate_euler;
///
/// let mut int = Integrator::new(1);
/// let time = [0.0, 0.1, 0.2];
/// let inputs = [1.0, 1.0, 1.0];
/// let mut outputs = [0.0; 3];
/// simulate_euler(&mut int, 0.1, &time, &[0.0], &inputs, &mut outputs).unwrap();
/// assert!((outputs[2] - 0.2).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct Integrator {
    width: usize,
}

impl Integrator {
    /// Create a bank of `width` integrators
    pub fn new(width: usize) -> Self {
        Self { width }
    }
}

impl Block for Integrator {
    fn num_states(&self) -> usize {
        self.width
    }

    fn num_inputs(&self) -> usize {
        self.width
    }

    fn num_outputs(&self) -> usize {
        self.width
    }

    #[inline]
    fn output(&mut self, _t: f64, state: &[f64], output: &mut [f64]) {
        output_state(state, output);
    }

    #[inline]
    fn derivative(&mut self, _t: f64, _state: &[f64], input: &[f64], d_state: &mut [f64]) {
        d_state.copy_from_slice(input);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integrator_dimensions() {
        let int = Integrator::new(3);
        assert_eq!(int.num_states(), 3);
        assert_eq!(int.num_inputs(), 3);
        assert_eq!(int.num_outputs(), 3);
    }

    #[test]
    fn test_integrator_derivative_is_input() {
        let mut int = Integrator::new(2);
        let mut d = [0.0; 2];
        int.derivative(0.0, &[5.0, 6.0], &[1.0, -1.0], &mut d);
        assert_eq!(d, [1.0, -1.0]);
    }

    #[test]
    fn test_integrator_output_is_state() {
        let mut int = Integrator::new(2);
        let mut y = [0.0; 2];
        int.output(0.0, &[5.0, 6.0], &mut y);
        assert_eq!(y, [5.0, 6.0]);
    }
}
