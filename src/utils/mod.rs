//! Utility constants

pub mod constants;
