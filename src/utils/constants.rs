//! Simulation constants and defaults

/// Default simulation timestep
pub const SIM_TIMESTEP: f64 = 0.01;

/// Default simulation duration
pub const SIM_DURATION: f64 = 10.0;

/// Default simulation start time
pub const SIM_START_TIME: f64 = 0.0;
