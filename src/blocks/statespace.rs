//! StateSpace block: strictly proper Linear Time-Invariant (LTI) system
//!
//! Implements state-space representation:
//!   dx/dt = Ax + Bu
//!   y = Cx
//!
//! where:
//!   - A: n×n state matrix
//!   - B: n×m input matrix
//!   - C: p×n output matrix
//!   - x: n-dimensional state vector
//!   - u: m-dimensional input vector
//!   - y: p-dimensional output vector
//!
//! There is no feedthrough term: the output depends on the state only.

use nalgebra::{DMatrix, DVectorView, DVectorViewMut};
use thiserror::Error;

use crate::block::Block;

/// Inconsistent matrix shapes
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StateSpaceError {
    #[error("A must be square, got {rows}x{cols}")]
    NonSquareA { rows: usize, cols: usize },

    #[error("B has {found} rows, expected {expected}")]
    BRows { expected: usize, found: usize },

    #[error("C has {found} columns, expected {expected}")]
    CColumns { expected: usize, found: usize },

    #[error("Time constant must be positive and finite, got {0}")]
    InvalidTimeConstant(f64),
}

/// StateSpace: strictly proper LTI model
///
/// # Example (SISO - First order system)
///
/// ```
/// use blocksim::blocks::StateSpace;
/// use nalgebra::DMatrix;
///
/// // RC circuit: dx/dt = -x/RC + u/RC, y = x
/// let rc = 1.0;
/// let ss = StateSpace::new(
///     DMatrix::from_element(1, 1, -1.0 / rc), // A
///     DMatrix::from_element(1, 1, 1.0 / rc),  // B
///     DMatrix::from_element(1, 1, 1.0),       // C
/// )
/// .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct StateSpace {
    a: DMatrix<f64>,
    b: DMatrix<f64>,
    c: DMatrix<f64>,
}

impl StateSpace {
    /// Create a StateSpace block, checking matrix shapes
    pub fn new(a: DMatrix<f64>, b: DMatrix<f64>, c: DMatrix<f64>) -> Result<Self, StateSpaceError> {
        let n = a.nrows();
        if a.ncols() != n {
            return Err(StateSpaceError::NonSquareA {
                rows: n,
                cols: a.ncols(),
            });
        }
        if b.nrows() != n {
            return Err(StateSpaceError::BRows {
                expected: n,
                found: b.nrows(),
            });
        }
        if c.ncols() != n {
            return Err(StateSpaceError::CColumns {
                expected: n,
                found: c.ncols(),
            });
        }
        Ok(Self { a, b, c })
    }

    /// First order lag: dx/dt = (u - x) / tau, y = x
    ///
    /// `tau` must be positive and finite.
    pub fn first_order(tau: f64) -> Result<Self, StateSpaceError> {
        if !(tau.is_finite() && tau > 0.0) {
            return Err(StateSpaceError::InvalidTimeConstant(tau));
        }
        Ok(Self {
            a: DMatrix::from_element(1, 1, -1.0 / tau),
            b: DMatrix::from_element(1, 1, 1.0 / tau),
            c: DMatrix::identity(1, 1),
        })
    }

    pub fn a(&self) -> &DMatrix<f64> {
        &self.a
    }

    pub fn b(&self) -> &DMatrix<f64> {
        &self.b
    }

    pub fn c(&self) -> &DMatrix<f64> {
        &self.c
    }
}

impl Block for StateSpace {
    fn num_states(&self) -> usize {
        self.a.nrows()
    }

    fn num_inputs(&self) -> usize {
        self.b.ncols()
    }

    fn num_outputs(&self) -> usize {
        self.c.nrows()
    }

    fn output(&mut self, _t: f64, state: &[f64], output: &mut [f64]) {
        let x = DVectorView::from_slice(state, state.len());
        let mut y = DVectorViewMut::from_slice(output, self.c.nrows());
        self.c.mul_to(&x, &mut y);
    }

    fn derivative(&mut self, _t: f64, state: &[f64], input: &[f64], d_state: &mut [f64]) {
        let x = DVectorView::from_slice(state, state.len());
        let u = DVectorView::from_slice(input, input.len());
        let mut dx = DVectorViewMut::from_slice(d_state, self.a.nrows());
        self.a.mul_to(&x, &mut dx);
        dx.gemv(1.0, &self.b, &u, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_statespace_shape_checks() {
        let err = StateSpace::new(
            DMatrix::zeros(2, 3),
            DMatrix::zeros(2, 1),
            DMatrix::zeros(1, 2),
        )
        .unwrap_err();
        assert_eq!(err, StateSpaceError::NonSquareA { rows: 2, cols: 3 });

        let err = StateSpace::new(
            DMatrix::zeros(2, 2),
            DMatrix::zeros(3, 1),
            DMatrix::zeros(1, 2),
        )
        .unwrap_err();
        assert_eq!(err, StateSpaceError::BRows { expected: 2, found: 3 });

        let err = StateSpace::new(
            DMatrix::zeros(2, 2),
            DMatrix::zeros(2, 1),
            DMatrix::zeros(1, 3),
        )
        .unwrap_err();
        assert_eq!(err, StateSpaceError::CColumns { expected: 2, found: 3 });
    }

    #[test]
    fn test_statespace_mimo_derivative() {
        let mut ss = StateSpace::new(
            DMatrix::from_row_slice(2, 2, &[-1.0, 0.0, 0.0, -2.0]),
            DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 1.0]),
            DMatrix::from_row_slice(1, 2, &[1.0, 1.0]),
        )
        .unwrap();
        assert_eq!(ss.num_states(), 2);
        assert_eq!(ss.num_inputs(), 2);
        assert_eq!(ss.num_outputs(), 1);

        let mut d = [0.0; 2];
        ss.derivative(0.0, &[1.0, 2.0], &[0.5, 0.25], &mut d);
        assert_relative_eq!(d[0], -0.5);
        assert_relative_eq!(d[1], -3.75);

        let mut y = [0.0];
        ss.output(0.0, &[1.0, 2.0], &mut y);
        assert_relative_eq!(y[0], 3.0);
    }

    #[test]
    fn test_first_order_lag() {
        let mut lag = StateSpace::first_order(0.5).unwrap();
        let mut d = [0.0];
        lag.derivative(0.0, &[1.0], &[3.0], &mut d);
        assert_relative_eq!(d[0], 4.0);
    }

    #[test]
    fn test_first_order_rejects_bad_time_constant() {
        for tau in [0.0, -1.0, f64::INFINITY] {
            assert_eq!(
                StateSpace::first_order(tau).unwrap_err(),
                StateSpaceError::InvalidTimeConstant(tau)
            );
        }
        assert!(matches!(
            StateSpace::first_order(f64::NAN),
            Err(StateSpaceError::InvalidTimeConstant(_))
        ));
    }
}
