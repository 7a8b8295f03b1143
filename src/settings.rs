//! Simulation settings types.

use serde::{Deserialize, Serialize};

use crate::simulation::{num_time_steps, time_vector};
use crate::utils::constants::{SIM_DURATION, SIM_START_TIME, SIM_TIMESTEP};

/// Available fixed-step solvers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolverType {
    /// Forward Euler (1st order)
    Euler,
    /// Classical RK4 (4th order)
    RK4,
}

impl Default for SolverType {
    fn default() -> Self {
        SolverType::RK4
    }
}

impl SolverType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SolverType::Euler => "Euler",
            SolverType::RK4 => "RK4",
        }
    }
}

/// Simulation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Start time
    pub t0: f64,

    /// Simulation duration
    pub duration: f64,

    /// Time step
    pub dt: f64,

    /// Solver type
    pub solver: SolverType,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            t0: SIM_START_TIME,
            duration: SIM_DURATION,
            dt: SIM_TIMESTEP,
            solver: SolverType::RK4,
        }
    }
}

impl SimulationSettings {
    /// Number of points on the time grid, including both ends
    pub fn num_steps(&self) -> usize {
        num_time_steps(self.dt, self.duration)
    }

    /// Time grid `t0, t0 + dt, ...`
    pub fn time_vector(&self) -> Vec<f64> {
        time_vector(self.num_steps(), self.dt, self.t0)
    }
}
