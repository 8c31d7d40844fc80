//! Hardware Abstraction Layer
//!
//! Embassy-backed timing for the STM32G474 target.

pub mod timer;
