//! blocksim - Composable block simulation core
//!
//! Simulates continuous-time dynamical systems built from blocks. A block maps
//! time, state and input to a state derivative and an output; blocks with
//! independent state vectors compose into a single block with a combined state
//! vector and a caller-supplied input routing rule.
//!
//! # Architecture
//!
//! - [`Block`]: the `h` (output), `f` (derivative) and optional observe hooks
//! - [`BlockSystem`]: hierarchical composition with contiguous child storage
//! - [`solvers`]: single fixed-step Euler and RK4 integrators
//! - [`simulation`]: trajectory drivers over a whole time vector
//!
//! # Example
//!
//! ```
//! use blocksim::prelude::*;
//!
//! // Damped oscillator driven by a unit force
//! let mut plant = Ode::with_inputs(2, 1, |_t, x, u, dx| {
//!     dx[0] = x[1];
//!     dx[1] = -x[0] - 0.5 * x[1] + u[0];
//! });
//!
//! let time = time_vector(101, 0.01, 0.0);
//! let inputs = vec![1.0; time.len()];
//! let mut outputs = vec![0.0; time.len() * 2];
//!
//! simulate_rk4(&mut plant, 0.01, &time, &[0.0, 0.0], &inputs, &inputs, &mut outputs).unwrap();
//! assert!(outputs[200] > 0.0);
//! ```

pub mod block;
pub mod blocks;
pub mod settings;
pub mod simulation;
pub mod solvers;
pub mod system;
pub mod utils;

pub use block::{output_state, Block, Observation};
pub use blocks::*;
pub use settings::{SimulationSettings, SolverType};
pub use simulation::{Simulation, Trajectory};
pub use system::{BlockSystem, CompositionError, Signals, SystemBuilder};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::block::{output_state, Block, Observation};
    pub use crate::blocks::*;
    pub use crate::settings::{SimulationSettings, SolverType};
    pub use crate::simulation::*;
    pub use crate::solvers::*;
    pub use crate::system::*;
}
