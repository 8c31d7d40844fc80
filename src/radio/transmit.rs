//! Transmit Channel
//!
//! Owns the RF oscillator and the producer side of the symbol ring.
//!
//! # Symbol handoff
//!
//! The scheduler is the single writer: it copies a whole packet into the
//! ring and then publishes the new write position with release ordering.
//! The symbol clock (a separate task or interrupt) is the single reader: it
//! loads the write position with acquire ordering and never reads past it.
//!
//! ```text
//!   writer                          reader
//!   ------                          ------
//!   claimed = w+n, fence(Release)
//!   store symbols[w .. w+n]
//!   write_pos = w+n  (Release) ---> load write_pos (Acquire)
//!                                   read symbols[r]
//!                                   fence(Acquire), load claimed
//! ```
//!
//! The second load catches a writer that lapped the reader while the slot
//! was being read; the symbol is then discarded as an overrun.
//!
//! Positions are free-running `u32` counters; the ring index is the
//! position modulo [`SYMBOL_RING_SIZE`].

use core::sync::atomic::{fence, AtomicU32, AtomicU8, Ordering};

use crate::beacon::BeaconError;
use crate::config::{SYMBOL_RING_SIZE, TONE_SPACING_DEN, TONE_SPACING_NUM_MHZ};
use crate::types::{ClockOutput, Frequency};

/// RF generator control used by the scheduler
pub trait Oscillator {
    /// Check the hardware is present and bind it to `output`
    ///
    /// Returns `false` when the oscillator cannot be used.
    fn attach(&mut self, output: ClockOutput) -> bool;

    /// Program the carrier (tone 0) frequency
    fn set_carrier(&mut self, carrier: Frequency);

    /// Enable RF output
    fn start(&mut self);

    /// Disable RF output (idle / power-down)
    fn stop(&mut self);
}

/// Per-symbol retuning used by the symbol clock
pub trait ToneOscillator: Oscillator {
    /// Move the output to `carrier + offset_millihertz`
    fn shift_tone(&mut self, offset_millihertz: u32);
}

impl<O: Oscillator + ?Sized> Oscillator for &mut O {
    fn attach(&mut self, output: ClockOutput) -> bool {
        (**self).attach(output)
    }

    fn set_carrier(&mut self, carrier: Frequency) {
        (**self).set_carrier(carrier);
    }

    fn start(&mut self) {
        (**self).start();
    }

    fn stop(&mut self) {
        (**self).stop();
    }
}

impl<O: ToneOscillator + ?Sized> ToneOscillator for &mut O {
    fn shift_tone(&mut self, offset_millihertz: u32) {
        (**self).shift_tone(offset_millihertz);
    }
}

/// Frequency offset of a 4-FSK symbol above the carrier, in milli-hertz
#[must_use]
pub const fn tone_offset_millihertz(symbol: u8) -> u32 {
    ((symbol as u64 & 0x03) * TONE_SPACING_NUM_MHZ / TONE_SPACING_DEN) as u32
}

/// Lock-free single-writer / single-reader symbol ring
pub struct SymbolBuffer {
    symbols: [AtomicU8; SYMBOL_RING_SIZE],
    write_pos: AtomicU32,
    claimed: AtomicU32,
}

impl SymbolBuffer {
    /// Create an empty ring
    #[must_use]
    pub const fn new() -> Self {
        const EMPTY: AtomicU8 = AtomicU8::new(0);
        Self {
            symbols: [EMPTY; SYMBOL_RING_SIZE],
            write_pos: AtomicU32::new(0),
            claimed: AtomicU32::new(0),
        }
    }

    /// Number of symbols ever written
    #[must_use]
    pub fn write_position(&self) -> u32 {
        self.write_pos.load(Ordering::Acquire)
    }

    /// Copy `symbols` into the ring and publish the new write position
    ///
    /// Must only be called from the single producer.
    pub fn publish(&self, symbols: &[u8]) -> u32 {
        let start = self.write_pos.load(Ordering::Relaxed);
        let end = start.wrapping_add(symbols.len() as u32);

        // Claim the slots before any of them is overwritten
        self.claimed.store(end, Ordering::Relaxed);
        fence(Ordering::Release);

        for (i, &symbol) in symbols.iter().enumerate() {
            let slot = (start as usize).wrapping_add(i) % SYMBOL_RING_SIZE;
            self.symbols[slot].store(symbol, Ordering::Relaxed);
        }
        self.write_pos.store(end, Ordering::Release);
        end
    }

    fn symbol_at(&self, position: u32) -> u8 {
        self.symbols[position as usize % SYMBOL_RING_SIZE].load(Ordering::Relaxed)
    }

    /// Highest position the writer may be overwriting, ordered after prior reads
    fn claimed_after_read(&self) -> u32 {
        fence(Ordering::Acquire);
        self.claimed.load(Ordering::Relaxed)
    }
}

impl Default for SymbolBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Consumer cursor over a [`SymbolBuffer`]
pub struct SymbolReader<'b> {
    buffer: &'b SymbolBuffer,
    read_pos: u32,
    overruns: u32,
}

impl<'b> SymbolReader<'b> {
    /// Start reading at the current write position (only new packets are seen)
    #[must_use]
    pub fn new(buffer: &'b SymbolBuffer) -> Self {
        Self {
            buffer,
            read_pos: buffer.write_position(),
            overruns: 0,
        }
    }

    /// Symbols published but not yet read
    #[must_use]
    pub fn pending(&self) -> u32 {
        self.buffer.write_position().wrapping_sub(self.read_pos)
    }

    /// Number of symbols consumed so far (the read position)
    #[must_use]
    pub const fn read_position(&self) -> u32 {
        self.read_pos
    }

    /// Times the writer lapped the reader
    #[must_use]
    pub const fn overruns(&self) -> u32 {
        self.overruns
    }

    /// Take the next symbol, if one has been published
    ///
    /// If the writer has lapped the reader, the cursor skips forward to the
    /// oldest symbol still held by the ring. A symbol whose slot was claimed
    /// by the writer during the read is dropped and `None` returned; the
    /// next call resumes at the oldest intact symbol.
    pub fn next_symbol(&mut self) -> Option<u8> {
        let write = self.buffer.write_position();
        let pending = write.wrapping_sub(self.read_pos);
        if pending == 0 {
            return None;
        }
        if pending as usize > SYMBOL_RING_SIZE {
            if self.read_pos.wrapping_sub(write) as usize <= SYMBOL_RING_SIZE {
                // Skipped past a publish that is still in progress
                return None;
            }
            self.read_pos = write.wrapping_sub(SYMBOL_RING_SIZE as u32);
            self.overruns = self.overruns.saturating_add(1);
        }

        let symbol = self.buffer.symbol_at(self.read_pos);

        let claimed = self.buffer.claimed_after_read();
        if claimed.wrapping_sub(self.read_pos) as usize > SYMBOL_RING_SIZE {
            self.read_pos = claimed.wrapping_sub(SYMBOL_RING_SIZE as u32);
            self.overruns = self.overruns.saturating_add(1);
            return None;
        }

        self.read_pos = self.read_pos.wrapping_add(1);
        Some(symbol)
    }
}

/// RF channel: oscillator, carrier and the producer side of the symbol ring
pub struct TransmitChannel<'b, O> {
    oscillator: O,
    buffer: &'b SymbolBuffer,
    symbol_period_us: u32,
    start_offset_us: u32,
    carrier: Frequency,
    output: ClockOutput,
}

impl<'b, O: Oscillator> TransmitChannel<'b, O> {
    /// Bind an oscillator and symbol ring into a channel
    ///
    /// # Errors
    ///
    /// - [`BeaconError::InvalidSymbolPeriod`] when `symbol_period_us` is zero
    /// - [`BeaconError::OscillatorUnavailable`] when the oscillator cannot be
    ///   attached to `output`
    pub fn bind(
        symbol_period_us: u32,
        start_offset_us: u32,
        mut oscillator: O,
        output: ClockOutput,
        buffer: &'b SymbolBuffer,
    ) -> Result<Self, BeaconError> {
        if symbol_period_us == 0 {
            return Err(BeaconError::InvalidSymbolPeriod);
        }
        if !oscillator.attach(output) {
            return Err(BeaconError::OscillatorUnavailable);
        }
        Ok(Self {
            oscillator,
            buffer,
            symbol_period_us,
            start_offset_us,
            carrier: Frequency::default(),
            output,
        })
    }

    /// Carrier frequency (tone 0)
    #[must_use]
    pub const fn carrier(&self) -> Frequency {
        self.carrier
    }

    /// Change the carrier; applied on the next [`start`](Self::start)
    pub fn set_carrier(&mut self, carrier: Frequency) {
        self.carrier = carrier;
    }

    /// Symbol duration
    #[must_use]
    pub const fn symbol_period_us(&self) -> u32 {
        self.symbol_period_us
    }

    /// Delay from keying to the first symbol
    #[must_use]
    pub const fn start_offset_us(&self) -> u32 {
        self.start_offset_us
    }

    /// Bound output channel
    #[must_use]
    pub const fn output(&self) -> ClockOutput {
        self.output
    }

    /// Symbol ring shared with the consumer
    #[must_use]
    pub const fn buffer(&self) -> &'b SymbolBuffer {
        self.buffer
    }

    /// Number of symbols ever handed to the consumer
    #[must_use]
    pub fn write_position(&self) -> u32 {
        self.buffer.write_position()
    }

    /// Borrow the oscillator
    #[must_use]
    pub const fn oscillator(&self) -> &O {
        &self.oscillator
    }

    /// Program the carrier and enable RF
    pub fn start(&mut self) {
        self.oscillator.set_carrier(self.carrier);
        self.oscillator.start();
    }

    /// Disable RF
    pub fn stop(&mut self) {
        self.oscillator.stop();
    }

    /// Copy a packet into the ring; returns the new write position
    pub fn push_symbols(&mut self, symbols: &[u8]) -> u32 {
        self.buffer.publish(symbols)
    }
}

#[cfg(feature = "embedded")]
pub use shared::SharedOscillator;

#[cfg(feature = "embedded")]
mod shared {
    use core::cell::RefCell;

    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
    use embassy_sync::blocking_mutex::Mutex;

    use super::{Oscillator, ToneOscillator};
    use crate::types::{ClockOutput, Frequency};

    /// Oscillator shared between the scheduler and the symbol clock
    ///
    /// Each call runs inside a critical section, so a tone change can never
    /// interleave with a carrier reprogram.
    pub struct SharedOscillator<'a, O> {
        inner: &'a Mutex<CriticalSectionRawMutex, RefCell<O>>,
    }

    impl<'a, O> SharedOscillator<'a, O> {
        /// Wrap a shared oscillator
        #[must_use]
        pub const fn new(inner: &'a Mutex<CriticalSectionRawMutex, RefCell<O>>) -> Self {
            Self { inner }
        }
    }

    impl<O> Clone for SharedOscillator<'_, O> {
        fn clone(&self) -> Self {
            Self { inner: self.inner }
        }
    }

    impl<O: Oscillator> Oscillator for SharedOscillator<'_, O> {
        fn attach(&mut self, output: ClockOutput) -> bool {
            self.inner.lock(|osc| osc.borrow_mut().attach(output))
        }

        fn set_carrier(&mut self, carrier: Frequency) {
            self.inner.lock(|osc| osc.borrow_mut().set_carrier(carrier));
        }

        fn start(&mut self) {
            self.inner.lock(|osc| osc.borrow_mut().start());
        }

        fn stop(&mut self) {
            self.inner.lock(|osc| osc.borrow_mut().stop());
        }
    }

    impl<O: ToneOscillator> ToneOscillator for SharedOscillator<'_, O> {
        fn shift_tone(&mut self, offset_millihertz: u32) {
            self.inner
                .lock(|osc| osc.borrow_mut().shift_tone(offset_millihertz));
        }
    }
}
