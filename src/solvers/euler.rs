//! Forward Euler method for numerical integration

use crate::block::{Block, Observation};

/// One explicit forward Euler step
///
/// # Mathematical Form
/// ```text
/// y       = h(t_n, x_n)
/// dx      = f(t_n, x_n, u_n)
/// x_{n+1} = x_n + dt * dx
/// ```
///
/// The output is evaluated at `(t, state)` before the derivative, then the
/// block's observe hook sees all of `d_state`, `state`, `input` and `output`.
///
/// # Characteristics
/// - Order: 1
/// - Stages: 1
/// - Explicit, fixed timestep
/// - Not A-stable
///
/// `next` and `state` are distinct buffers here. Use [`euler_step_in_place`]
/// to overwrite the state directly.
#[allow(clippy::too_many_arguments)]
pub fn euler_step<B: Block + ?Sized>(
    block: &mut B,
    t: f64,
    dt: f64,
    state: &[f64],
    input: &[f64],
    output: &mut [f64],
    d_state: &mut [f64],
    next: &mut [f64],
) {
    debug_assert_eq!(next.len(), state.len());
    evaluate(block, t, state, input, output, d_state);

    for ((x_next, &x), &dx) in next.iter_mut().zip(state).zip(d_state.iter()) {
        *x_next = x + dx * dt;
    }
}

/// One forward Euler step that overwrites `state` with the next state
pub fn euler_step_in_place<B: Block + ?Sized>(
    block: &mut B,
    t: f64,
    dt: f64,
    state: &mut [f64],
    input: &[f64],
    output: &mut [f64],
    d_state: &mut [f64],
) {
    evaluate(block, t, state, input, output, d_state);

    for (x, &dx) in state.iter_mut().zip(d_state.iter()) {
        *x += dx * dt;
    }
}

/// h, then f, then the observe hook
#[inline]
fn evaluate<B: Block + ?Sized>(
    block: &mut B,
    t: f64,
    state: &[f64],
    input: &[f64],
    output: &mut [f64],
    d_state: &mut [f64],
) {
    debug_assert_eq!(state.len(), block.num_states());
    debug_assert_eq!(d_state.len(), block.num_states());
    debug_assert_eq!(output.len(), block.num_outputs());

    block.output(t, state, output);
    block.derivative(t, state, input, d_state);
    block.observe(&Observation {
        time: t,
        d_state,
        state,
        input,
        output,
    });
}
