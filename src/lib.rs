//! WSPR Beacon Firmware Library
//!
//! This library provides the core of a GPS-disciplined WSPR beacon for an
//! STM32G474 driving an `Si5351A` synthesiser. A GPS receiver supplies
//! absolute time; the beacon dead-reckons between fixes with the local
//! monotonic clock and keys a 162-symbol 4-FSK packet at the start of every
//! selected two-minute slot.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      BEACON CONTEXT                          │
//! │  Identity  │  Poll (imperative shell)  │  Event sink         │
//! ├─────────────────────────────────────────────────────────────┤
//! │                     FUNCTIONAL CORE                          │
//! │  Slot scheduler + latch  │  WSPR encoder  │  Time reference  │
//! ├─────────────────────────────────────────────────────────────┤
//! │                  TRANSMIT / DRIVER LAYER                     │
//! │  Transmit channel  │  Symbol ring  │  Si5351 (blocking I2C)  │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    RTOS / SCHEDULER                          │
//! │           embassy-rs (async/await executor)                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Design Principles
//!
//! - **Functional core, imperative shell**: the scheduler returns an action,
//!   the beacon performs it
//! - **Type-driven design**: a zero skip factor or an over-long callsign is
//!   unrepresentable
//! - **No unsafe**: the symbol handoff is built from atomics only
//! - **Host-testable**: everything but the embassy glue builds with `std`

#![cfg_attr(feature = "embedded", no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Re-export dependencies needed by applications (only in embedded mode)
#[cfg(feature = "embedded")]
pub use embassy_executor;
#[cfg(feature = "embedded")]
pub use embassy_stm32;
#[cfg(feature = "embedded")]
pub use embassy_time;

/// Hardware Abstraction Layer
///
/// Embassy-backed clocks for the STM32G474.
#[cfg(feature = "embedded")]
pub mod hal;

/// Peripheral Drivers
///
/// `Si5351A` synthesiser driver and its frequency maths.
pub mod drivers;

/// Beacon Control Logic
///
/// Slot scheduler, scheduler events and the transmit channel.
pub mod radio;

/// Beacon context: identity, init and the poll loop body
pub mod beacon;

/// GPS time reference and the monotonic clock seam
pub mod gps;

/// WSPR message encoding
pub mod wspr;

/// Shared types used across modules
pub mod types;

/// System configuration and constants
pub mod config;

/// Prelude module for common imports
#[cfg(feature = "embedded")]
pub mod prelude {
    //! Convenient re-exports for common types and traits.

    pub use crate::beacon::{BeaconError, BeaconIdentity, BeaconIo, PollStatus, WsprBeacon};
    pub use crate::config::*;
    pub use crate::gps::{MonotonicClock, SharedTimeReference, TimeReference, TimeSource};
    pub use crate::radio::events::{DefmtSink, EventSink, SchedulerEvent};
    pub use crate::radio::transmit::{
        tone_offset_millihertz, Oscillator, SharedOscillator, SymbolBuffer, SymbolReader,
        ToneOscillator,
    };
    pub use crate::types::*;

    // Common traits
    pub use embedded_hal::delay::DelayNs;
    pub use embedded_hal::i2c::I2c;

    // Embassy
    pub use embassy_time::{Duration, Instant, Timer};

    // Error handling
    pub use core::result::Result;

    // Logging
    pub use defmt::{debug, error, info, trace, warn};
}
