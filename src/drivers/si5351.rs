//! `Si5351A` Clock Synthesizer Driver
//!
//! Generates the WSPR carrier on one clock output of a `Si5351A`.
//!
//! The carrier is planned once per transmission (even integer multisynth,
//! fractional PLL A). Each 4-FSK tone then costs a single 8-byte PLL write,
//! short enough for the symbol clock to do inline.
//!
//! The driver is blocking and generic over [`embedded_hal::i2c::I2c`]. Bus
//! errors inside the [`Oscillator`] methods are counted in
//! [`Si5351::faults`] instead of being returned.

use embedded_hal::i2c::I2c;

use crate::config::{SI5351_I2C_ADDR, SI5351_XTAL_FREQ};
use crate::drivers::si5351_calc::{plan_millihertz, retune_pll, MsParams, PllParams, SynthPlan};
use crate::radio::transmit::{Oscillator, ToneOscillator};
use crate::types::{ClockOutput, Frequency};

/// `Si5351A` register addresses
mod reg {
    pub const DEVICE_STATUS: u8 = 0;
    pub const OUTPUT_ENABLE: u8 = 3;
    pub const CLK0_CONTROL: u8 = 16;
    pub const PLLA_PARAMS: u8 = 26;
    pub const MS0_PARAMS: u8 = 42;
    pub const PLL_RESET: u8 = 177;
    pub const CRYSTAL_LOAD: u8 = 183;
}

/// `SYS_INIT` flag in the device status register
const STATUS_SYS_INIT: u8 = 0x80;

/// CLK control: powered down
const CLK_POWER_DOWN: u8 = 0x80;

/// CLK control: integer mode, PLL A, multisynth source
const CLK_INT_PLLA_MS: u8 = 0x4C;

/// PLL reset register: reset PLL A
const PLLA_RESET: u8 = 0x20;

impl ClockOutput {
    const fn control_reg(self) -> u8 {
        reg::CLK0_CONTROL + self.index()
    }

    const fn ms_reg(self) -> u8 {
        reg::MS0_PARAMS + 8 * self.index()
    }

    const fn enable_mask(self) -> u8 {
        1 << self.index()
    }
}

/// Drive strength setting
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DriveStrength {
    /// 2mA drive
    Drive2mA,
    /// 4mA drive
    Drive4mA,
    /// 6mA drive
    Drive6mA,
    /// 8mA drive (maximum)
    #[default]
    Drive8mA,
}

impl DriveStrength {
    const fn as_reg(self) -> u8 {
        match self {
            Self::Drive2mA => 0,
            Self::Drive4mA => 1,
            Self::Drive6mA => 2,
            Self::Drive8mA => 3,
        }
    }
}

/// Crystal load capacitance
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CrystalLoad {
    /// 6 pF load
    Load6pF,
    /// 8 pF load
    Load8pF,
    /// 10 pF load
    #[default]
    Load10pF,
}

impl CrystalLoad {
    const fn as_reg(self) -> u8 {
        match self {
            Self::Load6pF => 0b0101_0010,
            Self::Load8pF => 0b1001_0010,
            Self::Load10pF => 0b1101_0010,
        }
    }
}

/// Lay out P1/P2/P3 (and the R divider) in the 8-register block order
fn param_block((p1, p2, p3): (u32, u32, u32), r_div: u8) -> [u8; 8] {
    [
        ((p3 >> 8) & 0xFF) as u8,
        (p3 & 0xFF) as u8,
        (r_div << 4) | ((p1 >> 16) & 0x03) as u8,
        ((p1 >> 8) & 0xFF) as u8,
        (p1 & 0xFF) as u8,
        (((p3 >> 12) & 0xF0) | ((p2 >> 16) & 0x0F)) as u8,
        ((p2 >> 8) & 0xFF) as u8,
        (p2 & 0xFF) as u8,
    ]
}

/// `Si5351A` driver bound to one clock output
pub struct Si5351<I2C> {
    i2c: I2C,
    address: u8,
    xtal_hz: u64,
    load: CrystalLoad,
    drive: DriveStrength,
    output: ClockOutput,
    output_enable: u8,
    carrier: Frequency,
    plan: Option<SynthPlan>,
    faults: u32,
}

impl<I2C: I2c> Si5351<I2C> {
    /// Create a driver with the board defaults (25 MHz crystal, 0x60)
    #[must_use]
    pub fn new(i2c: I2C) -> Self {
        Self {
            i2c,
            address: SI5351_I2C_ADDR,
            xtal_hz: u64::from(SI5351_XTAL_FREQ),
            load: CrystalLoad::default(),
            drive: DriveStrength::default(),
            output: ClockOutput::default(),
            output_enable: 0xFF, // All outputs disabled
            carrier: Frequency::default(),
            plan: None,
            faults: 0,
        }
    }

    /// Use a different reference crystal
    #[must_use]
    pub const fn with_xtal(mut self, xtal_hz: u32) -> Self {
        self.xtal_hz = xtal_hz as u64;
        self
    }

    /// Use a different crystal load capacitance
    #[must_use]
    pub const fn with_crystal_load(mut self, load: CrystalLoad) -> Self {
        self.load = load;
        self
    }

    /// Use a different output drive strength
    #[must_use]
    pub const fn with_drive(mut self, drive: DriveStrength) -> Self {
        self.drive = drive;
        self
    }

    /// Bus errors seen since construction
    #[must_use]
    pub const fn faults(&self) -> u32 {
        self.faults
    }

    /// Current synthesis plan, if a carrier has been programmed
    #[must_use]
    pub const fn plan(&self) -> Option<&SynthPlan> {
        self.plan.as_ref()
    }

    /// Bound output
    #[must_use]
    pub const fn output(&self) -> ClockOutput {
        self.output
    }

    /// Release the bus
    pub fn release(self) -> I2C {
        self.i2c
    }

    /// Check the device answers and has finished its power-on init
    ///
    /// # Errors
    ///
    /// Returns the bus error if the status register cannot be read.
    pub fn is_ready(&mut self) -> Result<bool, I2C::Error> {
        let mut status = [0u8];
        self.i2c
            .write_read(self.address, &[reg::DEVICE_STATUS], &mut status)?;
        Ok(status[0] & STATUS_SYS_INIT == 0)
    }

    /// Put the chip in a known state with `output` selected and disabled
    ///
    /// # Errors
    ///
    /// Returns the first bus error.
    pub fn configure(&mut self, output: ClockOutput) -> Result<(), I2C::Error> {
        self.output_enable = 0xFF;
        self.write_reg(reg::OUTPUT_ENABLE, self.output_enable)?;
        self.write_reg(reg::CRYSTAL_LOAD, self.load.as_reg())?;

        for clk in [ClockOutput::Clk0, ClockOutput::Clk1, ClockOutput::Clk2] {
            self.write_reg(clk.control_reg(), CLK_POWER_DOWN)?;
        }
        self.write_reg(output.control_reg(), CLK_INT_PLLA_MS | self.drive.as_reg())?;

        self.output = output;
        Ok(())
    }

    /// Program PLL A and the output multisynth for `carrier`
    ///
    /// Returns `Ok(false)` when the frequency cannot be synthesised.
    ///
    /// # Errors
    ///
    /// Returns the first bus error.
    pub fn program_carrier(&mut self, carrier: Frequency) -> Result<bool, I2C::Error> {
        let Some(plan) = plan_millihertz(self.xtal_hz, carrier.as_millihertz()) else {
            return Ok(false);
        };

        self.write_pll(&plan.pll)?;
        self.write_multisynth(self.output, &plan.ms)?;
        self.write_reg(reg::PLL_RESET, PLLA_RESET)?;

        self.carrier = carrier;
        self.plan = Some(plan);
        Ok(true)
    }

    /// Move the output to carrier + `offset_mhz`, keeping the multisynth
    ///
    /// # Errors
    ///
    /// Returns the bus error from the PLL write.
    pub fn retune(&mut self, offset_mhz: u32) -> Result<bool, I2C::Error> {
        let Some(plan) = self.plan else {
            return Ok(false);
        };
        let target = self.carrier.as_millihertz() + u64::from(offset_mhz);
        let Some(pll) = retune_pll(self.xtal_hz, plan.ms.a, target) else {
            return Ok(false);
        };
        // No PLL reset here: a reset would glitch the output mid-symbol
        self.write_pll(&pll)?;
        Ok(true)
    }

    /// Enable or disable the bound output
    ///
    /// # Errors
    ///
    /// Returns the bus error.
    pub fn set_enabled(&mut self, enabled: bool) -> Result<(), I2C::Error> {
        if enabled {
            self.output_enable &= !self.output.enable_mask();
        } else {
            self.output_enable |= self.output.enable_mask();
        }
        self.write_reg(reg::OUTPUT_ENABLE, self.output_enable)
    }

    fn write_reg(&mut self, reg: u8, value: u8) -> Result<(), I2C::Error> {
        self.i2c.write(self.address, &[reg, value])
    }

    fn write_block(&mut self, base: u8, block: [u8; 8]) -> Result<(), I2C::Error> {
        let mut buf = [0u8; 9];
        buf[0] = base;
        buf[1..].copy_from_slice(&block);
        self.i2c.write(self.address, &buf)
    }

    fn write_pll(&mut self, params: &PllParams) -> Result<(), I2C::Error> {
        self.write_block(reg::PLLA_PARAMS, param_block(params.to_registers(), 0))
    }

    fn write_multisynth(&mut self, output: ClockOutput, params: &MsParams) -> Result<(), I2C::Error> {
        self.write_block(output.ms_reg(), param_block(params.to_registers(), params.r_div))
    }

    /// Count a failed bus operation
    fn record<T>(&mut self, result: Result<T, I2C::Error>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(_) => {
                self.faults = self.faults.saturating_add(1);
                #[cfg(feature = "embedded")]
                defmt::warn!("si5351: i2c fault #{}", self.faults);
                None
            }
        }
    }
}

impl<I2C: I2c> Oscillator for Si5351<I2C> {
    fn attach(&mut self, output: ClockOutput) -> bool {
        let ready = self.is_ready();
        if self.record(ready) != Some(true) {
            return false;
        }
        let configured = self.configure(output);
        self.record(configured).is_some()
    }

    fn set_carrier(&mut self, carrier: Frequency) {
        let programmed = self.program_carrier(carrier);
        if self.record(programmed) == Some(false) {
            // Tones must not be placed around a carrier that was never set
            self.plan = None;
            #[cfg(feature = "embedded")]
            defmt::error!("si5351: cannot synthesise {}", carrier);
        }
    }

    fn start(&mut self) {
        let result = self.set_enabled(true);
        self.record(result);
    }

    fn stop(&mut self) {
        let result = self.set_enabled(false);
        self.record(result);
    }
}

impl<I2C: I2c> ToneOscillator for Si5351<I2C> {
    fn shift_tone(&mut self, offset_millihertz: u32) {
        let result = self.retune(offset_millihertz);
        self.record(result);
    }
}
