//! WSPR Beacon Main Application
//!
//! Entry point for the STM32G474 + `Si5351A` beacon firmware.
//! Initializes hardware and spawns the scheduler and symbol clock tasks.

#![no_std]
#![no_main]

use core::cell::RefCell;

use defmt::{info, unwrap};
use embassy_executor::Spawner;
use embassy_stm32::i2c::I2c as StmI2c;
use embassy_stm32::mode::Blocking;
use embassy_stm32::time::Hertz;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::{Delay, Ticker};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use wspr_beacon::drivers::si5351::{CrystalLoad, DriveStrength, Si5351};
use wspr_beacon::hal::timer::{SymbolClock, UptimeClock};
use wspr_beacon::prelude::*;
use wspr_beacon::wspr::WsprEncoder;

type Synth = Si5351<StmI2c<'static, Blocking>>;
type SharedSynth = Mutex<CriticalSectionRawMutex, RefCell<Synth>>;
type Beacon = WsprBeacon<
    'static,
    SharedOscillator<'static, Synth>,
    &'static SharedTimeReference,
    UptimeClock,
    Delay,
    WsprEncoder,
    DefmtSink,
>;

/// Load capacitance of the 25 MHz reference crystal
const CRYSTAL_LOAD: CrystalLoad = CrystalLoad::Load8pF;

/// Output drive into the low-pass filter
const DRIVE: DriveStrength = DriveStrength::Drive8mA;

/// Polls between verbose diagnostics (one minute at 250 ms)
const DIAGNOSTIC_EVERY: u32 = 240;

/// Written by the GPS receiver path via `publish_fix`
static TIME_REF: SharedTimeReference = SharedTimeReference::new();

/// Symbol handoff between the scheduler and the symbol clock
static SYMBOLS: SymbolBuffer = SymbolBuffer::new();

static SYNTH: StaticCell<SharedSynth> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("WSPR Beacon Firmware v{}", env!("CARGO_PKG_VERSION"));

    // Initialize STM32G474 peripherals with default clock configuration
    let config = embassy_stm32::Config::default();
    let p = embassy_stm32::init(config);

    info!("Peripherals initialized");

    // I2C1 for the Si5351A: PB8 = SCL, PB9 = SDA
    let i2c = StmI2c::new_blocking(
        p.I2C1,
        p.PB8,
        p.PB9,
        Hertz(I2C_FREQUENCY_HZ),
        Default::default(),
    );

    info!("I2C1 initialized at {} Hz", I2C_FREQUENCY_HZ);

    let si5351 = Si5351::new(i2c)
        .with_xtal(SI5351_XTAL_FREQ)
        .with_crystal_load(CRYSTAL_LOAD)
        .with_drive(DRIVE);
    let synth: &'static SharedSynth = SYNTH.init(Mutex::new(RefCell::new(si5351)));

    let io = BeaconIo {
        time: &TIME_REF,
        clock: UptimeClock,
        delay: Delay,
    };
    let beacon = match WsprBeacon::init(
        &BeaconConfig::default(),
        SharedOscillator::new(synth),
        &SYMBOLS,
        io,
    ) {
        Ok(beacon) => beacon.with_sink(DefmtSink),
        Err(e) => defmt::panic!("beacon init failed: {}", e),
    };

    info!(
        "{} {} {} on {}",
        beacon.identity().callsign().as_str(),
        beacon.identity().locator().as_str(),
        beacon.identity().power(),
        beacon.carrier()
    );

    unwrap!(spawner.spawn(symbol_clock_task(SharedOscillator::new(synth), &SYMBOLS)));
    unwrap!(spawner.spawn(beacon_task(beacon)));

    info!("Tasks spawned");
}

/// Scheduler task - polls the beacon at a fraction of the slot width
#[embassy_executor::task]
async fn beacon_task(mut beacon: Beacon) {
    let mut ticker = Ticker::every(Duration::from_millis(POLL_PERIOD_MS));
    let mut polls: u32 = 0;

    loop {
        ticker.next().await;
        polls = polls.wrapping_add(1);
        beacon.poll(polls % DIAGNOSTIC_EVERY == 0);
    }
}

/// Symbol clock task - one tone per symbol period while symbols are pending
#[embassy_executor::task]
async fn symbol_clock_task(
    mut synth: SharedOscillator<'static, Synth>,
    symbols: &'static SymbolBuffer,
) {
    let mut reader = SymbolReader::new(symbols);
    let mut clock = SymbolClock::from_period_us(WSPR_SYMBOL_PERIOD_US);
    let mut idle = true;

    loop {
        clock.tick().await;

        match reader.next_symbol() {
            Some(symbol) => {
                if idle {
                    // Align the grid to the first symbol of the packet
                    clock.reset();
                    idle = false;
                    info!("packet started at {}", reader.read_position().wrapping_sub(1));
                }
                synth.shift_tone(tone_offset_millihertz(symbol));
            }
            None if !idle => {
                idle = true;
                info!("packet complete, {} overruns", reader.overruns());
            }
            None => {}
        }
    }
}
