//! WSPR Beacon
//!
//! The beacon context ties together the station identity, the transmit
//! channel and the slot scheduler. It is the imperative shell around
//! [`TxScheduler`]: the scheduler decides, the beacon keys the hardware.
//!
//! # Poll sequence
//!
//! ```text
//! poll ─► snapshot + uptime ─► TxScheduler::update
//!            │
//!            ├─ Err(reason)  ─► ReferenceUnavailable (no side effects)
//!            ├─ Key          ─► encode ─► start ─► settle 100 ms ─► hand off symbols
//!            ├─ Hold         ─► nothing
//!            └─ Unkey        ─► stop oscillator
//! ```
//!
//! Each beacon owns its own latch, so several beacons (one per band or
//! output) can be polled side by side.

use core::fmt;

use embedded_hal::delay::DelayNs;

use crate::config::{BeaconConfig, ScheduleConfig, SETTLE_DELAY_MS, WSPR_SYMBOL_PERIOD_US};
use crate::gps::{MonotonicClock, TimeReference, TimeSource};
use crate::radio::events::{EventSink, NullSink, SchedulerEvent};
use crate::radio::scheduler::{TxAction, TxScheduler};
use crate::radio::transmit::{Oscillator, SymbolBuffer, TransmitChannel};
use crate::types::{Callsign, FieldError, Frequency, Locator, TxPower};
use crate::wspr::{EncodedPacket, PacketEncoder, WsprEncoder};

/// Beacon construction failure
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BeaconError {
    /// Oscillator did not respond or could not bind the output
    OscillatorUnavailable,
    /// Channel symbol period was zero
    InvalidSymbolPeriod,
}

impl fmt::Display for BeaconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OscillatorUnavailable => write!(f, "oscillator unavailable"),
            Self::InvalidSymbolPeriod => write!(f, "symbol period must be non-zero"),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for BeaconError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::OscillatorUnavailable => defmt::write!(f, "OscillatorUnavailable"),
            Self::InvalidSymbolPeriod => defmt::write!(f, "InvalidSymbolPeriod"),
        }
    }
}

/// Outcome of one scheduler poll
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollStatus {
    /// Absolute time was usable; the slot decision was applied
    Ok,
    /// No fix yet, or the fix is stale beyond holdover; retry next poll
    ReferenceUnavailable,
}

#[cfg(feature = "embedded")]
impl defmt::Format for PollStatus {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Ok => defmt::write!(f, "Ok"),
            Self::ReferenceUnavailable => defmt::write!(f, "ReferenceUnavailable"),
        }
    }
}

/// Station identity carried in every packet
///
/// Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BeaconIdentity {
    callsign: Callsign,
    locator: Locator,
    power: TxPower,
}

impl BeaconIdentity {
    /// Build with truncating field copies
    ///
    /// Oversized callsigns and locators lose their tail without notice.
    #[must_use]
    pub fn new(callsign: &str, locator: &str, power_dbm: u8) -> Self {
        Self {
            callsign: Callsign::truncating(callsign),
            locator: Locator::truncating(locator),
            power: TxPower::from_dbm(power_dbm),
        }
    }

    /// Build, rejecting empty or oversized fields and malformed locators
    ///
    /// # Errors
    ///
    /// Returns the first [`FieldError`] hit by the callsign or the locator.
    pub fn strict(callsign: &str, locator: &str, power_dbm: u8) -> Result<Self, FieldError> {
        Ok(Self {
            callsign: Callsign::new(callsign)?,
            locator: Locator::grid(locator)?,
            power: TxPower::from_dbm(power_dbm),
        })
    }

    /// Station callsign
    #[must_use]
    pub const fn callsign(&self) -> &Callsign {
        &self.callsign
    }

    /// Maidenhead locator
    #[must_use]
    pub const fn locator(&self) -> &Locator {
        &self.locator
    }

    /// Reported power
    #[must_use]
    pub const fn power(&self) -> TxPower {
        self.power
    }
}

/// Time and delay collaborators of a beacon
#[derive(Clone, Copy, Debug, Default)]
pub struct BeaconIo<T, C, D> {
    /// GPS time reference
    pub time: T,
    /// Local monotonic clock
    pub clock: C,
    /// Blocking delay used for the oscillator settle wait
    pub delay: D,
}

/// WSPR beacon context
pub struct WsprBeacon<'b, O, T, C, D, E = WsprEncoder, S = NullSink> {
    identity: BeaconIdentity,
    channel: TransmitChannel<'b, O>,
    scheduler: TxScheduler,
    packet: EncodedPacket,
    encoder: E,
    io: BeaconIo<T, C, D>,
    sink: S,
}

impl<'b, O, T, C, D> WsprBeacon<'b, O, T, C, D>
where
    O: Oscillator,
    T: TimeSource,
    C: MonotonicClock,
    D: DelayNs,
{
    /// Build a beacon
    ///
    /// Callsign and locator are copied with truncation. The transmit channel
    /// is bound with the WSPR symbol period and the carrier is set to
    /// dial + shift.
    ///
    /// # Errors
    ///
    /// Fails when the transmit channel cannot be bound to the oscillator.
    pub fn init(
        config: &BeaconConfig<'_>,
        oscillator: O,
        buffer: &'b SymbolBuffer,
        io: BeaconIo<T, C, D>,
    ) -> Result<Self, BeaconError> {
        let mut channel = TransmitChannel::bind(
            WSPR_SYMBOL_PERIOD_US,
            0,
            oscillator,
            config.plan.output,
            buffer,
        )?;
        channel.set_carrier(config.plan.effective());

        Ok(Self {
            identity: BeaconIdentity::new(config.callsign, config.locator, config.power_dbm),
            channel,
            scheduler: TxScheduler::new(config.schedule),
            packet: EncodedPacket::empty(),
            encoder: WsprEncoder,
            io,
            sink: NullSink,
        })
    }
}

impl<'b, O, T, C, D, E, S> WsprBeacon<'b, O, T, C, D, E, S>
where
    O: Oscillator,
    T: TimeSource,
    C: MonotonicClock,
    D: DelayNs,
    E: PacketEncoder,
    S: EventSink,
{
    /// Replace the packet encoder
    #[must_use]
    pub fn with_encoder<E2: PacketEncoder>(self, encoder: E2) -> WsprBeacon<'b, O, T, C, D, E2, S> {
        WsprBeacon {
            identity: self.identity,
            channel: self.channel,
            scheduler: self.scheduler,
            packet: self.packet,
            encoder,
            io: self.io,
            sink: self.sink,
        }
    }

    /// Subscribe an event sink
    #[must_use]
    pub fn with_sink<S2: EventSink>(self, sink: S2) -> WsprBeacon<'b, O, T, C, D, E, S2> {
        WsprBeacon {
            identity: self.identity,
            channel: self.channel,
            scheduler: self.scheduler,
            packet: self.packet,
            encoder: self.encoder,
            io: self.io,
            sink,
        }
    }

    /// Station identity
    #[must_use]
    pub const fn identity(&self) -> &BeaconIdentity {
        &self.identity
    }

    /// Transmit channel
    #[must_use]
    pub const fn channel(&self) -> &TransmitChannel<'b, O> {
        &self.channel
    }

    /// Slot scheduler (latch and policy)
    #[must_use]
    pub const fn scheduler(&self) -> &TxScheduler {
        &self.scheduler
    }

    /// Change the scheduling policy
    pub fn set_schedule(&mut self, schedule: ScheduleConfig) {
        self.scheduler.set_config(schedule);
    }

    /// Last packet produced by [`create_packet`](Self::create_packet)
    #[must_use]
    pub const fn packet(&self) -> &EncodedPacket {
        &self.packet
    }

    /// Event sink
    #[must_use]
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// Event sink, mutably
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Carrier frequency keyed on the next transmission
    #[must_use]
    pub const fn carrier(&self) -> Frequency {
        self.channel.carrier()
    }

    /// Set the carrier frequency (band change between transmissions)
    pub fn set_dial_freq(&mut self, freq: Frequency) {
        self.channel.set_carrier(freq);
    }

    /// Encode the identity into the output packet
    pub fn create_packet(&mut self) -> &EncodedPacket {
        self.packet = self.encoder.encode(
            self.identity.callsign(),
            self.identity.locator(),
            self.identity.power(),
        );
        &self.packet
    }

    /// Hand the encoded packet to the transmit channel
    ///
    /// Returns the new write position.
    ///
    /// # Panics
    ///
    /// Panics if the carrier is at or below the 1.1 MHz hardware floor.
    /// This is a configuration error, not a runtime condition.
    pub fn send_packet(&mut self) -> u32 {
        let carrier = self.channel.carrier();
        assert!(
            carrier.is_keyable(),
            "carrier {carrier} is at or below the hardware floor"
        );
        self.channel.push_symbols(self.packet.symbols())
    }

    /// Run one scheduler step against the live time source and clock
    pub fn poll(&mut self, verbose: bool) -> PollStatus {
        let reference = self.io.time.snapshot();
        let now_us = self.io.clock.uptime_us();
        self.poll_at(&reference, now_us, verbose)
    }

    /// Run one scheduler step against an explicit snapshot and uptime
    pub fn poll_at(&mut self, reference: &TimeReference, now_us: u64, verbose: bool) -> PollStatus {
        if verbose {
            self.sink.record(SchedulerEvent::Diagnostics {
                uptime_us: now_us,
                fix_count: reference.fix_count,
                solution_active: reference.solution_active,
                holdover_override: self.scheduler.config().holdover_override,
                age_secs: reference.age_secs(now_us),
            });
        }

        let (decision, action) = match self.scheduler.update(reference, now_us) {
            Ok(step) => step,
            Err(reason) => {
                self.sink
                    .record(SchedulerEvent::ReferenceUnavailable { reason });
                return PollStatus::ReferenceUnavailable;
            }
        };

        self.sink.record(SchedulerEvent::SlotEvaluated {
            unix_now: decision.unix_now,
            slot: decision.slot,
            qualifying: decision.qualifying,
        });

        match action {
            TxAction::Key => {
                self.sink
                    .record(SchedulerEvent::TriggerArmed { slot: decision.slot });
                self.create_packet();
                self.channel.start();
                self.io.delay.delay_ms(SETTLE_DELAY_MS);
                let write_position = self.send_packet();
                self.sink.record(SchedulerEvent::TriggerFired {
                    slot: decision.slot,
                    carrier: self.channel.carrier(),
                    write_position,
                });
            }
            TxAction::Hold => {}
            TxAction::Unkey { was_armed } => {
                if was_armed {
                    self.sink
                        .record(SchedulerEvent::TriggerCleared { slot: decision.slot });
                }
                self.channel.stop();
            }
        }

        PollStatus::Ok
    }
}
