//! Beacon Control Logic
//!
//! Slot scheduling, its event stream and the transmit channel.
//! The scheduler is the functional core; the channel is where it meets
//! the oscillator.

pub mod events;
pub mod scheduler;
pub mod transmit;
