//! Base solver types

use std::collections::TryReserveError;

use log::trace;
use nalgebra::DVector;
use thiserror::Error;

/// Solver-related errors
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Failed to allocate solver scratch memory")]
    Allocation(#[from] TryReserveError),

    #[error("Time vector is empty")]
    EmptyTimeVector,

    #[error("Dimension mismatch for {what}: expected {expected}, found {found}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Size of {what} overflows usize")]
    SizeOverflow { what: &'static str },

    #[error("Block has no output function")]
    MissingOutput,

    #[error("Timestep must be positive and finite, got {0}")]
    InvalidTimestep(f64),
}

/// Inputs sampled at the three RK4 evaluation times
#[derive(Debug, Clone, Copy)]
pub struct StageInputs<'a> {
    /// Input at `t`
    pub start: &'a [f64],
    /// Input at `t + dt/2`
    pub half: &'a [f64],
    /// Input at `t + dt`
    pub end: &'a [f64],
}

impl<'a> StageInputs<'a> {
    /// Hold the same input over the whole step
    pub fn constant(input: &'a [f64]) -> Self {
        Self {
            start: input,
            half: input,
            end: input,
        }
    }
}

/// Allocate a zeroed scratch vector without aborting on allocation failure
pub fn scratch_vector(len: usize) -> Result<DVector<f64>, SolverError> {
    let data = zeroed(len)?;
    trace!("allocated scratch vector of {len} states");
    Ok(DVector::from_vec(data))
}

pub(crate) fn zeroed(len: usize) -> Result<Vec<f64>, SolverError> {
    let mut data = Vec::new();
    data.try_reserve_exact(len)?;
    data.resize(len, 0.0);
    Ok(data)
}

/// Length of a row-major `rows x width` buffer
pub(crate) fn buffer_len(what: &'static str, rows: usize, width: usize) -> Result<usize, SolverError> {
    rows.checked_mul(width).ok_or(SolverError::SizeOverflow { what })
}

pub(crate) fn check_len(what: &'static str, expected: usize, found: usize) -> Result<(), SolverError> {
    if expected == found {
        Ok(())
    } else {
        Err(SolverError::DimensionMismatch {
            what,
            expected,
            found,
        })
    }
}
