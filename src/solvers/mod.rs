//! Numerical integration solvers
//!
//! Provides single-step fixed-timestep integrators:
//! - Forward Euler (1st order, optionally in place)
//! - Classic Runge-Kutta (RK4, 4th order)
//!
//! Both evaluate the block output at the start of the step, before any
//! derivative, so swapping solvers does not change when outputs are observed.

mod base;
mod euler;
mod rk4;

pub use base::*;
pub use euler::{euler_step, euler_step_in_place};
pub use rk4::{rk4_step, rk4_step_with, Rk4Scratch, Rk4Stages};
