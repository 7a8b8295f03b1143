//! Trajectory drivers
//!
//! Drive a block across a whole time vector with a fixed step. For a time
//! vector of length `N` the drivers evaluate the output `N` times and advance
//! the state `N - 1` times:
//!
//! ```text
//! for i in 0..N-1:
//!     Y[i] = h(time[i], x)
//!     x    = step(x)
//! Y[N-1] = h(time[N-1], x)
//! ```
//!
//! All buffers are row-major: row `i` of `inputs` holds the input at
//! `time[i]`, row `i` of `outputs` receives the output at `time[i]`.

use std::ops::Range;

use log::debug;
use nalgebra::DMatrix;

use crate::block::Block;
use crate::settings::{SimulationSettings, SolverType};
use crate::solvers::{
    buffer_len, check_len, euler_step_in_place, rk4_step, scratch_vector, zeroed, Rk4Scratch,
    SolverError, StageInputs,
};

/// Number of points on a time grid of length `duration` sampled every `dt`
///
/// Both ends are included: `floor(duration / dt + 1)`.
pub fn num_time_steps(dt: f64, duration: f64) -> usize {
    (duration / dt + 1.0).floor() as usize
}

/// Fill `time` with `t0, t0 + dt, t0 + 2dt, ...`
pub fn initialize_time(time: &mut [f64], dt: f64, t0: f64) {
    for (i, t) in time.iter_mut().enumerate() {
        *t = i as f64 * dt + t0;
    }
}

/// Time grid of `num_steps` points starting at `t0`
///
/// Allocates infallibly. [`Simulation::run`] builds its grid fallibly instead.
pub fn time_vector(num_steps: usize, dt: f64, t0: f64) -> Vec<f64> {
    let mut time = vec![0.0; num_steps];
    initialize_time(&mut time, dt, t0);
    time
}

#[inline]
fn row(index: usize, width: usize) -> Range<usize> {
    index * width..(index + 1) * width
}

/// Checks shared by both drivers, done before anything is allocated
fn validate<B: Block + ?Sized>(
    block: &B,
    time: &[f64],
    initial: &[f64],
    outputs: &[f64],
) -> Result<(), SolverError> {
    if time.is_empty() {
        return Err(SolverError::EmptyTimeVector);
    }
    if !block.has_output() {
        return Err(SolverError::MissingOutput);
    }
    check_len("initial state", block.num_states(), initial.len())?;
    let expected = buffer_len("outputs", time.len(), block.num_outputs())?;
    check_len("outputs", expected, outputs.len())
}

/// Simulate `block` over `time` with forward Euler
///
/// # Arguments
///
/// * `dt` - Time step used by every integration step
/// * `time` - Time vector, `N >= 1` points
/// * `initial` - Initial state (`num_states`)
/// * `inputs` - Input trajectory, `N x num_inputs`
/// * `outputs` - Output buffer, `N x num_outputs`
///
/// On error nothing is written to `outputs`.
pub fn simulate_euler<B: Block + ?Sized>(
    block: &mut B,
    dt: f64,
    time: &[f64],
    initial: &[f64],
    inputs: &[f64],
    outputs: &mut [f64],
) -> Result<(), SolverError> {
    validate(&*block, time, initial, outputs)?;
    let num_steps = time.len();
    let num_inputs = block.num_inputs();
    let num_outputs = block.num_outputs();
    check_len("inputs", buffer_len("inputs", num_steps, num_inputs)?, inputs.len())?;

    let mut state = scratch_vector(block.num_states())?;
    let mut d_state = scratch_vector(block.num_states())?;
    state.as_mut_slice().copy_from_slice(initial);

    debug!("euler: {} steps of {dt}", num_steps - 1);

    for i in 0..num_steps - 1 {
        euler_step_in_place(
            block,
            time[i],
            dt,
            state.as_mut_slice(),
            &inputs[row(i, num_inputs)],
            &mut outputs[row(i, num_outputs)],
            d_state.as_mut_slice(),
        );
    }

    let last = num_steps - 1;
    block.output(time[last], state.as_slice(), &mut outputs[row(last, num_outputs)]);

    debug!("euler: finished at t = {}", time[last]);

    Ok(())
}

/// Simulate `block` over `time` with classic RK4
///
/// # Arguments
///
/// * `dt` - Time step used by every integration step
/// * `time` - Time vector, `N >= 1` points
/// * `initial` - Initial state (`num_states`)
/// * `inputs` - Inputs at `time[i]`, `N x num_inputs`
/// * `half_inputs` - Inputs at `time[i] + dt/2`, `N x num_inputs` (the last row is not read)
/// * `outputs` - Output buffer, `N x num_outputs`
///
/// Step `i` reads `inputs[i]`, `half_inputs[i]` and `inputs[i + 1]`.
/// On error nothing is written to `outputs`.
pub fn simulate_rk4<B: Block + ?Sized>(
    block: &mut B,
    dt: f64,
    time: &[f64],
    initial: &[f64],
    inputs: &[f64],
    half_inputs: &[f64],
    outputs: &mut [f64],
) -> Result<(), SolverError> {
    validate(&*block, time, initial, outputs)?;
    let num_steps = time.len();
    let num_inputs = block.num_inputs();
    let num_outputs = block.num_outputs();
    let input_len = buffer_len("inputs", num_steps, num_inputs)?;
    check_len("inputs", input_len, inputs.len())?;
    check_len("half-step inputs", input_len, half_inputs.len())?;

    let mut state = scratch_vector(block.num_states())?;
    let mut scratch = Rk4Scratch::new(block.num_states())?;
    state.as_mut_slice().copy_from_slice(initial);

    debug!("rk4: {} steps of {dt}", num_steps - 1);

    for i in 0..num_steps - 1 {
        let stage_inputs = StageInputs {
            start: &inputs[row(i, num_inputs)],
            half: &half_inputs[row(i, num_inputs)],
            end: &inputs[row(i + 1, num_inputs)],
        };
        rk4_step(
            block,
            time[i],
            dt,
            state.as_slice(),
            stage_inputs,
            &mut outputs[row(i, num_outputs)],
            &mut scratch,
        );
        state.as_mut_slice().copy_from_slice(scratch.next());
    }

    let last = num_steps - 1;
    block.output(time[last], state.as_slice(), &mut outputs[row(last, num_outputs)]);

    debug!("rk4: finished at t = {}", time[last]);

    Ok(())
}

/// Outputs recorded on a time grid
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    time: Vec<f64>,
    outputs: Vec<f64>,
    num_outputs: usize,
}

impl Trajectory {
    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn num_steps(&self) -> usize {
        self.time.len()
    }

    pub fn num_outputs(&self) -> usize {
        self.num_outputs
    }

    /// Output row at `time[index]`
    pub fn output(&self, index: usize) -> &[f64] {
        &self.outputs[row(index, self.num_outputs)]
    }

    /// Output row at the last time point
    pub fn final_output(&self) -> &[f64] {
        self.output(self.num_steps() - 1)
    }

    /// All outputs, row-major
    pub fn outputs(&self) -> &[f64] {
        &self.outputs
    }

    /// Outputs as a `num_steps x num_outputs` matrix
    pub fn to_matrix(&self) -> DMatrix<f64> {
        DMatrix::from_row_slice(self.num_steps(), self.num_outputs, &self.outputs)
    }
}

/// Settings-driven simulation runner
///
/// Builds the time grid from [`SimulationSettings`], samples the input
/// function where the configured solver needs it and runs the matching driver.
///
/// # Example
///
/// ```
/// use blocksim::blocks::Integrator;
/// use blocksim::settings::{SimulationSettings, SolverType};
/// use blocksim::simulation::Simulation;
///
/// let sim = Simulation::new(SimulationSettings {
///     t0: 0.0,
///     duration: 1.0,
///     dt: 0.1,
///     solver: SolverType::RK4,
/// });
///
/// // y = integral of 2t = t^2
/// let mut int = Integrator::new(1);
/// let trajectory = sim.run(&mut int, &[0.0], |t, u| u[0] = 2.0 * t).unwrap();
///
/// assert_eq!(trajectory.num_steps(), 11);
/// assert!((trajectory.final_output()[0] - 1.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Simulation {
    settings: SimulationSettings,
}

impl Simulation {
    pub fn new(settings: SimulationSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    /// Run `block` from `initial`, with `input(t, u)` writing the input at `t`
    pub fn run<B, U>(&self, block: &mut B, initial: &[f64], mut input: U) -> Result<Trajectory, SolverError>
    where
        B: Block + ?Sized,
        U: FnMut(f64, &mut [f64]),
    {
        let dt = self.settings.dt;
        if !(dt.is_finite() && dt > 0.0) {
            return Err(SolverError::InvalidTimestep(dt));
        }

        // A tiny dt can make the grid too large to allocate
        let num_steps = self.settings.num_steps();
        let mut time = zeroed(num_steps)?;
        initialize_time(&mut time, dt, self.settings.t0);

        let num_inputs = block.num_inputs();
        let num_outputs = block.num_outputs();
        let input_len = buffer_len("inputs", num_steps, num_inputs)?;
        let output_len = buffer_len("outputs", num_steps, num_outputs)?;

        let mut inputs = zeroed(input_len)?;
        let mut outputs = zeroed(output_len)?;
        for (i, &t) in time.iter().enumerate() {
            input(t, &mut inputs[row(i, num_inputs)]);
        }

        match self.settings.solver {
            SolverType::Euler => {
                simulate_euler(block, dt, &time, initial, &inputs, &mut outputs)?;
            }
            SolverType::RK4 => {
                let mut half_inputs = zeroed(input_len)?;
                for (i, &t) in time.iter().enumerate() {
                    input(t + 0.5 * dt, &mut half_inputs[row(i, num_inputs)]);
                }
                simulate_rk4(block, dt, &time, initial, &inputs, &half_inputs, &mut outputs)?;
            }
        }

        Ok(Trajectory {
            time,
            outputs,
            num_outputs,
        })
    }
}
