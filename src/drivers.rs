//! Peripheral Drivers
//!
//! Drivers for external ICs. The synthesis maths is kept apart from the
//! bus traffic so it can be tested on the host.

pub mod si5351;
pub mod si5351_calc;
