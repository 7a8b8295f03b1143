//! Reference block implementations
//!
//! Small plants used to exercise the integrators and the composition layer.

mod integrator;
mod ode;
mod statespace;

pub use integrator::Integrator;
pub use ode::Ode;
pub use statespace::{StateSpace, StateSpaceError};
