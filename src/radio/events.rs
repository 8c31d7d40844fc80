//! Scheduler Events
//!
//! One event per scheduler state transition, published to an [`EventSink`].
//! Sinks are decoupled from the decision logic: the scheduler behaves the
//! same whether anything listens or not.

use crate::radio::scheduler::UnavailableReason;
use crate::types::Frequency;

/// Observable scheduler transition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerEvent {
    /// Poll found no usable absolute time
    ReferenceUnavailable {
        /// Missing fix or expired holdover
        reason: UnavailableReason,
    },
    /// Poll placed "now" on the slot grid
    SlotEvaluated {
        /// Dead-reckoned unix time
        unix_now: u64,
        /// Slot index within the hour
        slot: u8,
        /// Slot selected by the skip factor
        qualifying: bool,
    },
    /// Latch set on the first poll of a qualifying slot
    TriggerArmed {
        /// Slot index
        slot: u8,
    },
    /// Packet handed to the transmit channel
    TriggerFired {
        /// Slot index
        slot: u8,
        /// Carrier the packet is keyed on
        carrier: Frequency,
        /// Write position after the handoff
        write_position: u32,
    },
    /// Latch cleared on the first poll outside a qualifying slot
    TriggerCleared {
        /// Slot index
        slot: u8,
    },
    /// Raw poll inputs, emitted only for verbose polls
    Diagnostics {
        /// Local uptime
        uptime_us: u64,
        /// Fixes ever received
        fix_count: u32,
        /// Receiver solution active
        solution_active: bool,
        /// Holdover override setting
        holdover_override: bool,
        /// Fix age in whole seconds
        age_secs: u64,
    },
}

#[cfg(feature = "embedded")]
impl defmt::Format for SchedulerEvent {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::ReferenceUnavailable { reason } => {
                defmt::write!(f, "reference unavailable: {}", reason);
            }
            Self::SlotEvaluated {
                unix_now,
                slot,
                qualifying,
            } => defmt::write!(f, "t={} slot={} qualifying={}", unix_now, slot, qualifying),
            Self::TriggerArmed { slot } => defmt::write!(f, "armed slot {}", slot),
            Self::TriggerFired {
                slot,
                carrier,
                write_position,
            } => defmt::write!(f, "fired slot {} on {} (wr={})", slot, carrier, write_position),
            Self::TriggerCleared { slot } => defmt::write!(f, "cleared at slot {}", slot),
            Self::Diagnostics {
                uptime_us,
                fix_count,
                solution_active,
                holdover_override,
                age_secs,
            } => defmt::write!(
                f,
                "{} {} {} {} {}",
                uptime_us,
                fix_count,
                solution_active,
                holdover_override,
                age_secs
            ),
        }
    }
}

/// Subscriber for scheduler events
pub trait EventSink {
    /// Handle one event
    fn record(&mut self, event: SchedulerEvent);
}

/// Sink that discards everything
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn record(&mut self, _event: SchedulerEvent) {}
}

/// Bounded recorder; events past capacity are dropped
impl<const N: usize> EventSink for heapless::Vec<SchedulerEvent, N> {
    fn record(&mut self, event: SchedulerEvent) {
        let _ = self.push(event);
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn record(&mut self, event: SchedulerEvent) {
        (**self).record(event);
    }
}

/// Sink that logs every event over defmt
#[cfg(feature = "embedded")]
#[derive(Clone, Copy, Debug, Default)]
pub struct DefmtSink;

#[cfg(feature = "embedded")]
impl EventSink for DefmtSink {
    fn record(&mut self, event: SchedulerEvent) {
        match event {
            SchedulerEvent::ReferenceUnavailable { .. } => defmt::warn!("{}", event),
            SchedulerEvent::TriggerArmed { .. }
            | SchedulerEvent::TriggerFired { .. }
            | SchedulerEvent::TriggerCleared { .. } => defmt::info!("{}", event),
            SchedulerEvent::SlotEvaluated { .. } => defmt::debug!("{}", event),
            SchedulerEvent::Diagnostics { .. } => defmt::trace!("{}", event),
        }
    }
}
