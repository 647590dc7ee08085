//! Calculator demo: a stateless `(a, b) -> sum -> rounded string` chain.
//!
//! Both steps are plain functions. [`register`] exposes them to a
//! [`FunctionRegistry`](funcstream_events::FunctionRegistry) as `calculate`
//! and `round`, which compose as `calculate|round`.

pub mod calculation;
pub mod rounding;

pub use calculation::{
    CALCULATE, CalculationRequest, CalculationResult, ROUND, RoundedResult, calculate, register,
    round,
};
pub use rounding::{ROUNDING_SCALE, round_half_up};
