//! Classic 4th-order Runge-Kutta solver (RK4)

use nalgebra::DVector;

use super::{scratch_vector, SolverError, StageInputs};
use crate::block::{Block, Observation};

/// Named stage buffers for one RK4 step
///
/// Every field is an exclusive borrow, so the five buffers and the `state`
/// passed to [`rk4_step_with`] are pairwise distinct by construction. Reusing
/// one buffer for two stages does not compile:
///
/// ```compile_fail
/// use blocksim::solvers::Rk4Stages;
///
/// let mut next = [0.0; 2];
/// let mut shared = [0.0; 2];
/// let mut c = [0.0; 2];
/// let mut d = [0.0; 2];
/// let stages = Rk4Stages {
///     next: &mut next,
///     a: &mut shared,
///     b: &mut shared,
///     c: &mut c,
///     d: &mut d,
/// };
/// # drop(stages);
/// ```
#[derive(Debug)]
pub struct Rk4Stages<'s> {
    /// Intermediate state between stages, next state after the step
    pub next: &'s mut [f64],
    /// Slope at `t`
    pub a: &'s mut [f64],
    /// First slope at `t + dt/2`
    pub b: &'s mut [f64],
    /// Second slope at `t + dt/2`
    pub c: &'s mut [f64],
    /// Slope at `t + dt`
    pub d: &'s mut [f64],
}

/// Owned scratch memory for repeated RK4 steps
///
/// Holds the next-state vector and the four stage derivatives, each sized
/// `num_states`.
#[derive(Debug, Clone)]
pub struct Rk4Scratch {
    next: DVector<f64>,
    a: DVector<f64>,
    b: DVector<f64>,
    c: DVector<f64>,
    d: DVector<f64>,
}

impl Rk4Scratch {
    /// Allocate scratch for a block with `num_states` states
    pub fn new(num_states: usize) -> Result<Self, SolverError> {
        Ok(Self {
            next: scratch_vector(num_states)?,
            a: scratch_vector(num_states)?,
            b: scratch_vector(num_states)?,
            c: scratch_vector(num_states)?,
            d: scratch_vector(num_states)?,
        })
    }

    pub fn num_states(&self) -> usize {
        self.next.len()
    }

    /// State produced by the last step
    pub fn next(&self) -> &[f64] {
        self.next.as_slice()
    }

    /// Derivative at the start of the last step (stage A)
    pub fn derivative(&self) -> &[f64] {
        self.a.as_slice()
    }

    /// Split into disjoint stage buffers
    pub fn stages(&mut self) -> Rk4Stages<'_> {
        Rk4Stages {
            next: self.next.as_mut_slice(),
            a: self.a.as_mut_slice(),
            b: self.b.as_mut_slice(),
            c: self.c.as_mut_slice(),
            d: self.d.as_mut_slice(),
        }
    }
}

/// One classic RK4 step using owned scratch
///
/// The next state is left in [`Rk4Scratch::next`].
pub fn rk4_step<B: Block + ?Sized>(
    block: &mut B,
    t: f64,
    dt: f64,
    state: &[f64],
    inputs: StageInputs<'_>,
    output: &mut [f64],
    scratch: &mut Rk4Scratch,
) {
    rk4_step_with(block, t, dt, state, inputs, output, scratch.stages());
}

/// One classic RK4 step on caller-provided stage buffers
///
/// # Stage sequence
/// ```text
/// y    = h(t, x)
/// A    = f(t,        x,            u(t))
/// B    = f(t + dt/2, x + dt/2 * A, u(t + dt/2))
/// C    = f(t + dt/2, x + dt/2 * B, u(t + dt/2))
/// D    = f(t + dt,   x + dt * C,   u(t + dt))
/// next = x + dt * (A + 2B + 2C + D) / 6
/// ```
///
/// The output and the observe hook are evaluated once at `(t, state)`
/// before stage A, the same ordering as [`euler_step`](super::euler_step).
///
/// # Characteristics
/// - Order: 4
/// - Stages: 4
/// - Explicit, fixed timestep
/// - Not A-stable
pub fn rk4_step_with<B: Block + ?Sized>(
    block: &mut B,
    t: f64,
    dt: f64,
    state: &[f64],
    inputs: StageInputs<'_>,
    output: &mut [f64],
    stages: Rk4Stages<'_>,
) {
    let Rk4Stages { next, a, b, c, d } = stages;
    let n = state.len();
    debug_assert_eq!(n, block.num_states());
    debug_assert!(next.len() == n && a.len() == n && b.len() == n);
    debug_assert!(c.len() == n && d.len() == n);

    let half_dt = 0.5 * dt;
    let half_time = t + half_dt;
    let next_time = t + dt;

    block.output(t, state, output);
    block.derivative(t, state, inputs.start, a);
    block.observe(&Observation {
        time: t,
        d_state: a,
        state,
        input: inputs.start,
        output,
    });
    advance(next, state, a, half_dt);

    block.derivative(half_time, next, inputs.half, b);
    advance(next, state, b, half_dt);

    block.derivative(half_time, next, inputs.half, c);
    advance(next, state, c, dt);

    block.derivative(next_time, next, inputs.end, d);
    for i in 0..n {
        next[i] = state[i] + dt * (a[i] + 2.0 * b[i] + 2.0 * c[i] + d[i]) / 6.0;
    }
}

/// next = state + slope * h
#[inline]
fn advance(next: &mut [f64], state: &[f64], slope: &[f64], h: f64) {
    for ((x_next, &x), &k) in next.iter_mut().zip(state).zip(slope) {
        *x_next = x + k * h;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::Ode;
    use approx::assert_relative_eq;

    fn run_rk4<B: Block>(block: &mut B, x0: &[f64], dt: f64, steps: usize) -> Vec<f64> {
        let mut scratch = Rk4Scratch::new(x0.len()).unwrap();
        let mut state = x0.to_vec();
        let mut output = vec![0.0; block.num_outputs()];
        for i in 0..steps {
            let t = i as f64 * dt;
            rk4_step(block, t, dt, &state, StageInputs::constant(&[]), &mut output, &mut scratch);
            state.copy_from_slice(scratch.next());
        }
        state
    }

    #[test]
    fn test_rk4_exponential_decay() {
        // dx/dt = -x, x(0) = 1
        // Exact solution: x(t) = exp(-t)
        let mut block = Ode::new(1, |_t, x, _u, dx| dx[0] = -x[0]);
        let x = run_rk4(&mut block, &[1.0], 0.1, 10);

        assert_relative_eq!(x[0], (-1.0f64).exp(), epsilon = 1e-6);
    }

    #[test]
    fn test_rk4_harmonic_oscillator() {
        // d²x/dt² = -x => [x, v]' = [v, -x]
        // Exact: x(t) = cos(t), v(t) = -sin(t)
        let mut block = Ode::new(2, |_t, x, _u, dx| {
            dx[0] = x[1];
            dx[1] = -x[0];
        });
        let dt = 0.01;
        let t_final = 2.0 * std::f64::consts::PI;
        let n_steps = (t_final / dt) as usize;
        let x = run_rk4(&mut block, &[1.0, 0.0], dt, n_steps);

        let t_end = n_steps as f64 * dt;
        assert_relative_eq!(x[0], t_end.cos(), epsilon = 1e-8);
        assert_relative_eq!(x[1], -t_end.sin(), epsilon = 1e-8);
    }

    #[test]
    fn test_rk4_single_step_matches_taylor_series() {
        // x' = x: one RK4 step reproduces the 4th order Taylor polynomial exactly
        let mut block = Ode::new(1, |_t, x, _u, dx| dx[0] = x[0]);
        let dt: f64 = 0.3;
        let x0 = 2.0;
        let x = run_rk4(&mut block, &[x0], dt, 1);

        let taylor = x0 * (1.0 + dt + dt * dt / 2.0 + dt.powi(3) / 6.0 + dt.powi(4) / 24.0);
        assert_relative_eq!(x[0], taylor, epsilon = 1e-12);
    }

    #[test]
    fn test_rk4_zero_derivative() {
        let mut block = Ode::new(3, |_t, _x, _u, dx| dx.fill(0.0));
        let x0 = [1.5, -2.0, 0.25];
        let x = run_rk4(&mut block, &x0, 17.0, 3);

        assert_eq!(x, x0.to_vec());
    }

    #[test]
    fn test_rk4_stage_times_and_inputs() {
        // dx/dt = u, the input differs at each sample time
        let mut times = Vec::new();
        let mut block = Ode::with_inputs(1, 1, |_t, _x, u, dx| dx[0] = u[0]);
        let mut scratch = Rk4Scratch::new(1).unwrap();
        let mut y = [0.0];
        let inputs = StageInputs {
            start: &[1.0],
            half: &[2.0],
            end: &[4.0],
        };
        rk4_step(&mut block, 1.0, 0.5, &[0.0], inputs, &mut y, &mut scratch);

        // (1 + 2*2 + 2*2 + 4) / 6 * 0.5
        assert_relative_eq!(scratch.next()[0], 13.0 / 12.0);
        assert_eq!(scratch.derivative(), &[1.0]);

        // Time at which each stage is evaluated
        let mut recorder = Ode::new(1, |t, _x, _u, dx| {
            times.push(t);
            dx[0] = 0.0;
        });
        rk4_step(&mut recorder, 1.0, 0.5, &[0.0], StageInputs::constant(&[]), &mut y, &mut scratch);
        drop(recorder);
        assert_eq!(times, vec![1.0, 1.25, 1.25, 1.5]);
    }

    #[test]
    fn test_scratch_buffers_are_disjoint() {
        let mut scratch = Rk4Scratch::new(8).unwrap();
        assert_eq!(scratch.num_states(), 8);

        let stages = scratch.stages();
        let ranges = [
            stages.next.as_ptr_range(),
            stages.a.as_ptr_range(),
            stages.b.as_ptr_range(),
            stages.c.as_ptr_range(),
            stages.d.as_ptr_range(),
        ];
        for (i, r1) in ranges.iter().enumerate() {
            for r2 in &ranges[i + 1..] {
                assert!(r1.end <= r2.start || r2.end <= r1.start);
            }
        }
    }
}
