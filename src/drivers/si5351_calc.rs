//! Si5351 Frequency Calculation
//!
//! Fractional-N PLL and multisynth divider maths for the beacon carrier.
//! Pure integer arithmetic, testable on the host.
//!
//! # Theory of Operation
//!
//! The Si5351 uses a two-stage frequency synthesis:
//! 1. PLL stage: FVCO = FXTAL × (a + b/c) where 15 ≤ a ≤ 90
//! 2. Multisynth stage: FOUT = FVCO / (d + e/f) where 4 ≤ d ≤ 1800
//!
//! For WSPR the multisynth is held at an even integer divisor for the whole
//! transmission and every tone change is made in the PLL fraction alone.
//! With c at its 20-bit maximum the output step is FXTAL / c / d, well
//! below the 1.46 Hz tone spacing on every HF band.

/// PLL parameters for frequency calculation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PllParams {
    /// Integer part (15-90)
    pub a: u32,
    /// Numerator (0 to c-1)
    pub b: u32,
    /// Denominator (1-1048575)
    pub c: u32,
}

impl PllParams {
    /// Minimum PLL multiplier
    pub const MIN_A: u32 = 15;
    /// Maximum PLL multiplier
    pub const MAX_A: u32 = 90;
    /// Maximum denominator (20 bits)
    pub const MAX_C: u32 = 1_048_575;

    /// Create integer PLL params (b=0, c=1)
    #[must_use]
    pub const fn integer(a: u32) -> Self {
        Self { a, b: 0, c: 1 }
    }

    /// Create fractional PLL params
    #[must_use]
    pub const fn fractional(a: u32, b: u32, c: u32) -> Self {
        Self { a, b, c }
    }

    /// VCO frequency in milli-hertz for a crystal given in hertz
    #[must_use]
    pub fn vco_millihertz(&self, xtal_hz: u64) -> u64 {
        // FVCO = FXTAL × (a × c + b) / c, widened to avoid overflow
        let num = u128::from(xtal_hz)
            * 1000
            * (u128::from(self.a) * u128::from(self.c) + u128::from(self.b));
        (num / u128::from(self.c)) as u64
    }

    /// Validate parameters are in range
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.a >= Self::MIN_A
            && self.a <= Self::MAX_A
            && self.c >= 1
            && self.c <= Self::MAX_C
            && self.b < self.c
    }

    /// Calculate P1, P2, P3 register values for Si5351
    #[must_use]
    pub const fn to_registers(&self) -> (u32, u32, u32) {
        pack_params(self.a, self.b, self.c)
    }
}

/// Multisynth divider parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MsParams {
    /// Integer part (4, 6-1800)
    pub a: u32,
    /// Numerator
    pub b: u32,
    /// Denominator
    pub c: u32,
    /// R divider power of 2 (0-7 for 1, 2, 4, 8, 16, 32, 64, 128)
    pub r_div: u8,
}

impl MsParams {
    /// Minimum integer divisor
    pub const MIN_A: u32 = 4;
    /// Maximum integer divisor
    pub const MAX_A: u32 = 1800;
    /// Maximum denominator (20 bits)
    pub const MAX_C: u32 = 1_048_575;

    /// Create integer multisynth params (b=0, c=1)
    #[must_use]
    pub const fn integer(a: u32) -> Self {
        Self {
            a,
            b: 0,
            c: 1,
            r_div: 0,
        }
    }

    /// Create integer multisynth with R divider
    #[must_use]
    pub const fn integer_with_r(a: u32, r_div: u8) -> Self {
        Self {
            a,
            b: 0,
            c: 1,
            r_div,
        }
    }

    /// Output frequency in milli-hertz for a VCO given in milli-hertz
    #[must_use]
    pub fn output_millihertz(&self, vco_mhz: u64) -> u64 {
        // FOUT = FVCO × c / (a × c + b) / R
        let divisor = u128::from(self.a) * u128::from(self.c) + u128::from(self.b);
        let r = 1u128 << self.r_div;
        (u128::from(vco_mhz) * u128::from(self.c) / divisor / r) as u64
    }

    /// Validate parameters are in range
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        // Note: a=5 is not allowed
        let a_valid = self.a == 4 || (self.a >= 6 && self.a <= Self::MAX_A);
        let c_valid = self.c >= 1 && self.c <= Self::MAX_C;
        let b_valid = self.b < self.c;
        let r_valid = self.r_div <= 7;
        a_valid && c_valid && b_valid && r_valid
    }

    /// Even integer divisor with no R stage
    #[must_use]
    pub const fn is_even_integer(&self) -> bool {
        self.b == 0 && self.a % 2 == 0 && self.r_div == 0
    }

    /// Calculate P1, P2, P3 register values
    #[must_use]
    pub const fn to_registers(&self) -> (u32, u32, u32) {
        pack_params(self.a, self.b, self.c)
    }
}

/// Datasheet packing shared by PLL and multisynth
///
/// P1 = 128 × a + floor(128 × b/c) - 512,
/// P2 = 128 × b - c × floor(128 × b/c), P3 = c
const fn pack_params(a: u32, b: u32, c: u32) -> (u32, u32, u32) {
    // 128 × b overflows u32 for b near the 20-bit limit
    let floor_128b_c = ((128 * b as u64) / c as u64) as u32;
    let p1 = 128 * a + floor_128b_c - 512;
    let p2 = ((128 * b as u64) - (c as u64) * (floor_128b_c as u64)) as u32;
    (p1, p2, c)
}

/// Minimum VCO frequency (600 MHz)
pub const VCO_MIN_HZ: u64 = 600_000_000;
/// Maximum VCO frequency (900 MHz)
pub const VCO_MAX_HZ: u64 = 900_000_000;

/// Default crystal frequency (25 MHz)
pub const DEFAULT_XTAL_HZ: u64 = 25_000_000;

/// Synthesis plan for one output frequency
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SynthPlan {
    /// PLL A setting
    pub pll: PllParams,
    /// Multisynth setting (even integer)
    pub ms: MsParams,
    /// Frequency actually produced, in milli-hertz
    pub actual_millihertz: u64,
}

impl SynthPlan {
    /// Signed difference between the produced and requested frequency
    #[must_use]
    pub fn error_millihertz(&self, target_mhz: u64) -> i64 {
        self.actual_millihertz as i64 - target_mhz as i64
    }
}

/// Plan a carrier with milli-hertz resolution
///
/// Picks the largest even integer multisynth divisor that keeps the VCO in
/// range (highest VCO, best phase noise), then fits PLL A to it.
/// Returns `None` when no even divisor puts the VCO in range.
#[must_use]
pub fn plan_millihertz(xtal_hz: u64, target_mhz: u64) -> Option<SynthPlan> {
    let target_hz = target_mhz / 1000;
    if target_hz == 0 {
        return None;
    }

    // Round down to even
    let ms_a = (VCO_MAX_HZ / target_hz).min(u64::from(MsParams::MAX_A)) & !1;
    if ms_a < 6 || target_hz * ms_a < VCO_MIN_HZ {
        return None;
    }
    let ms = MsParams::integer(ms_a as u32);

    let pll = retune_pll(xtal_hz, ms.a, target_mhz)?;
    let actual_millihertz = ms.output_millihertz(pll.vco_millihertz(xtal_hz));

    Some(SynthPlan {
        pll,
        ms,
        actual_millihertz,
    })
}

/// PLL A setting that moves the output to `target_mhz` with the multisynth
/// held at `ms_a`
///
/// Used for every tone change: only the eight PLL registers are rewritten.
#[must_use]
pub fn retune_pll(xtal_hz: u64, ms_a: u32, target_mhz: u64) -> Option<PllParams> {
    let vco_mhz = target_mhz.checked_mul(u64::from(ms_a))?;
    let xtal_mhz = xtal_hz.checked_mul(1000)?;
    if xtal_mhz == 0 {
        return None;
    }

    let a = vco_mhz / xtal_mhz;
    if a < u64::from(PllParams::MIN_A) || a > u64::from(PllParams::MAX_A) {
        return None;
    }

    let c = PllParams::MAX_C;
    let remainder = vco_mhz - a * xtal_mhz;
    let scaled = u128::from(remainder) * u128::from(c);
    let rounded = (scaled + u128::from(xtal_mhz) / 2) / u128::from(xtal_mhz);
    // Rounding up to c would spill into the integer part
    let b = (rounded as u32).min(c - 1);

    Some(PllParams::fractional(a as u32, b, c))
}
