//! Compile-time configuration.
//!
//! Runtime-tunable settings (peripheral clock, panel geometry) live in
//! their own `Default`-able structs; everything here is fixed by the
//! hardware design.

/// Minimum time between button level transitions for a press to count
/// as a click.
pub const SWITCH_DEBOUNCE_MS: u64 = 50;

/// Encoder half-steps that make up one detent.
pub const HALF_STEPS_PER_TICK: i8 = 2;

/// Frequency at power-on, in Hz (shown as "100 kHz").
pub const DEFAULT_FREQUENCY_HZ: u32 = 100_000;

/// Duty / symmetry at power-on and after every waveform change.
pub const DEFAULT_PERCENT: u8 = 50;

/// Lowest and highest selectable duty / symmetry.
pub const MIN_PERCENT: u8 = 10;
pub const MAX_PERCENT: u8 = 90;

/// Duty / symmetry increment per encoder tick.
pub const PERCENT_STEP: u8 = 10;

/// Lowest and highest representable output frequency in Hz.
pub const MIN_FREQUENCY_HZ: u32 = 1;
pub const MAX_FREQUENCY_HZ: u32 = 999_000;

/// Number of cursor slots in the top menu.
pub const MENU_SLOTS: usize = 7;

/// Full-scale code of the 12-bit DAC.
pub const DAC_MAX_CODE: u16 = 4095;

/// Deepest sample table used by any frequency band.
pub const MAX_SAMPLES_PER_PERIOD: usize = 4000;
