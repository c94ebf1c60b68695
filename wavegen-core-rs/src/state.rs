//! The generator's single mutable aggregate and the small value types it
//! is built from.
//!
//! # Frequency representation
//!
//! [`GeneratorState`] stores the output frequency as a raw Hz value. The
//! display unit decides how that value is split into the three on-screen
//! digits:
//!
//! ```text
//! unit = kHz   frequency_hz = 105_000   digits = [1][0][5]  "105 kHz"
//! unit = Hz    frequency_hz =       7   digits = [ ][ ][7]  "7 Hz"
//! ```
//!
//! In `Hz` the stored value is always 1–999; in `kHz` it is always a
//! multiple of 1000 in 1000–999 000. The stored value is canonical; the
//! digits are derived from it.

use crate::config::{
    DEFAULT_FREQUENCY_HZ, DEFAULT_PERCENT, MAX_PERCENT, MENU_SLOTS, MIN_PERCENT, PERCENT_STEP,
};
use crate::error::GeneratorError;
use crate::input::Direction;

// ── Waveform ─────────────────────────────────────────────────────────────

/// Output wave shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Ramp,
}

impl Waveform {
    /// Cycle `Sine → Square → Ramp → Sine` clockwise, reversed otherwise.
    pub fn step(self, direction: Direction) -> Self {
        match (self, direction) {
            (Waveform::Sine, Direction::Clockwise) => Waveform::Square,
            (Waveform::Square, Direction::Clockwise) => Waveform::Ramp,
            (Waveform::Ramp, Direction::Clockwise) => Waveform::Sine,
            (Waveform::Sine, Direction::CounterClockwise) => Waveform::Ramp,
            (Waveform::Square, Direction::CounterClockwise) => Waveform::Sine,
            (Waveform::Ramp, Direction::CounterClockwise) => Waveform::Square,
        }
    }

    /// Short label for the waveform field.
    pub fn label(self) -> &'static str {
        match self {
            Waveform::Sine => "SINE",
            Waveform::Square => "SQR",
            Waveform::Ramp => "RAMP",
        }
    }

    /// Whether the duty / symmetry percentage shapes this waveform.
    pub fn uses_percent(self) -> bool {
        !matches!(self, Waveform::Sine)
    }
}

// ── DisplayUnit ──────────────────────────────────────────────────────────

/// Unit the three frequency digits are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayUnit {
    Hertz,
    KiloHertz,
}

impl DisplayUnit {
    /// Hz represented by one unit of the displayed number.
    pub fn scale(self) -> u32 {
        match self {
            DisplayUnit::Hertz => 1,
            DisplayUnit::KiloHertz => 1000,
        }
    }

    /// The other unit.
    pub fn toggled(self) -> Self {
        match self {
            DisplayUnit::Hertz => DisplayUnit::KiloHertz,
            DisplayUnit::KiloHertz => DisplayUnit::Hertz,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DisplayUnit::Hertz => "Hz",
            DisplayUnit::KiloHertz => "kHz",
        }
    }

    /// Inclusive Hz range representable with three digits in this unit.
    pub fn range_hz(self) -> (u32, u32) {
        (self.scale(), 999 * self.scale())
    }

    /// Whether `hz` can be shown exactly in this unit.
    pub fn represents(self, hz: u32) -> bool {
        let (min, max) = self.range_hz();
        (min..=max).contains(&hz) && hz % self.scale() == 0
    }
}

// ── Percent ──────────────────────────────────────────────────────────────

/// Square-wave duty or ramp symmetry, always 10–90 in steps of 10.
///
/// Construction saturates into range, so a zero-length ramp segment can
/// never reach the synthesizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Percent(u8);

impl Percent {
    pub const MIN: Percent = Percent(MIN_PERCENT);
    pub const MAX: Percent = Percent(MAX_PERCENT);
    pub const DEFAULT: Percent = Percent(DEFAULT_PERCENT);

    /// Saturate `value` into range and snap it down to a multiple of 10.
    ///
    /// ```
    /// use wavegen::Percent;
    ///
    /// assert_eq!(Percent::saturating(100).get(), 90);
    /// assert_eq!(Percent::saturating(0).get(), 10);
    /// assert_eq!(Percent::saturating(57).get(), 50);
    /// ```
    pub fn saturating(value: u8) -> Self {
        let snapped = value - value % PERCENT_STEP;
        Percent(snapped.clamp(MIN_PERCENT, MAX_PERCENT))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Move one step, saturating at the bounds (no wraparound).
    pub fn step(self, direction: Direction) -> Self {
        match direction {
            Direction::Clockwise => Percent::saturating(self.0.saturating_add(PERCENT_STEP)),
            Direction::CounterClockwise => {
                Percent::saturating(self.0.saturating_sub(PERCENT_STEP))
            }
        }
    }
}

impl Default for Percent {
    fn default() -> Self {
        Percent::DEFAULT
    }
}

// ── Digit ────────────────────────────────────────────────────────────────

/// One of the three editable frequency digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Digit {
    Hundreds,
    Tens,
    Ones,
}

impl Digit {
    /// Place value within the displayed number.
    pub fn place(self) -> u32 {
        match self {
            Digit::Hundreds => 100,
            Digit::Tens => 10,
            Digit::Ones => 1,
        }
    }

    /// Value (0–9) of this digit of `hz` as displayed in `unit`.
    pub fn value_of(self, hz: u32, unit: DisplayUnit) -> u8 {
        ((hz / unit.scale() / self.place()) % 10) as u8
    }

    /// Frequency after moving this digit one step.
    ///
    /// The digit wraps 9 → 0 (and 0 → 9) inside its own position; the
    /// other digits are left alone, so the Hz delta at the wrap is
    /// ∓9 × place. Results outside the unit's range are rejected.
    ///
    /// ```
    /// use wavegen::{Digit, Direction, DisplayUnit};
    ///
    /// let khz = DisplayUnit::KiloHertz;
    /// assert_eq!(Digit::Tens.step(105_000, khz, Direction::Clockwise), Ok(115_000));
    /// assert_eq!(Digit::Ones.step(109_000, khz, Direction::Clockwise), Ok(100_000));
    /// assert!(Digit::Ones.step(1_000, khz, Direction::CounterClockwise).is_err());
    /// ```
    pub fn step(
        self,
        hz: u32,
        unit: DisplayUnit,
        direction: Direction,
    ) -> Result<u32, GeneratorError> {
        let weight = self.place() * unit.scale();
        let digit = self.value_of(hz, unit);

        let next = match direction {
            Direction::Clockwise if digit == 9 => hz - 9 * weight,
            Direction::Clockwise => hz + weight,
            Direction::CounterClockwise if digit == 0 => hz + 9 * weight,
            Direction::CounterClockwise => hz - weight,
        };

        if unit.represents(next) {
            Ok(next)
        } else {
            Err(GeneratorError::FrequencyOutOfRange)
        }
    }
}

// ── Slot ─────────────────────────────────────────────────────────────────

/// Cursor positions of the top menu, in on-screen order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Slot {
    Waveform,
    Hundreds,
    Tens,
    Ones,
    Units,
    Percent,
    Transmit,
}

impl Slot {
    /// All slots in cursor order.
    pub const ALL: [Slot; MENU_SLOTS] = [
        Slot::Waveform,
        Slot::Hundreds,
        Slot::Tens,
        Slot::Ones,
        Slot::Units,
        Slot::Percent,
        Slot::Transmit,
    ];

    /// Position of this slot in [`Slot::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Slot at `index`, or `None` if `index >= MENU_SLOTS`.
    pub fn from_index(index: usize) -> Option<Self> {
        Slot::ALL.get(index).copied()
    }

    /// Neighbouring slot, wrapping at both ends.
    pub fn step(self, direction: Direction) -> Self {
        let next = match direction {
            Direction::Clockwise => (self.index() + 1) % MENU_SLOTS,
            Direction::CounterClockwise => (self.index() + MENU_SLOTS - 1) % MENU_SLOTS,
        };
        Slot::ALL[next]
    }

    /// Edit mode entered by clicking this slot, if it has one.
    ///
    /// `Units` and `Transmit` are one-shot actions and return `None`.
    pub fn edit_mode(self) -> Option<MenuMode> {
        match self {
            Slot::Waveform => Some(MenuMode::WaveformEdit),
            Slot::Hundreds => Some(MenuMode::HundredsEdit),
            Slot::Tens => Some(MenuMode::TensEdit),
            Slot::Ones => Some(MenuMode::OnesEdit),
            Slot::Percent => Some(MenuMode::PercentEdit),
            Slot::Units | Slot::Transmit => None,
        }
    }
}

// ── MenuMode ─────────────────────────────────────────────────────────────

/// What encoder ticks currently act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MenuMode {
    /// Ticks move the cursor; clicks select.
    #[default]
    Top,
    WaveformEdit,
    HundredsEdit,
    TensEdit,
    OnesEdit,
    PercentEdit,
}

impl MenuMode {
    /// Slot being edited, or `None` in [`MenuMode::Top`].
    pub fn bound_slot(self) -> Option<Slot> {
        match self {
            MenuMode::Top => None,
            MenuMode::WaveformEdit => Some(Slot::Waveform),
            MenuMode::HundredsEdit => Some(Slot::Hundreds),
            MenuMode::TensEdit => Some(Slot::Tens),
            MenuMode::OnesEdit => Some(Slot::Ones),
            MenuMode::PercentEdit => Some(Slot::Percent),
        }
    }

    /// Frequency digit bound to this mode, if any.
    pub fn digit(self) -> Option<Digit> {
        match self {
            MenuMode::HundredsEdit => Some(Digit::Hundreds),
            MenuMode::TensEdit => Some(Digit::Tens),
            MenuMode::OnesEdit => Some(Digit::Ones),
            _ => None,
        }
    }

    pub fn is_editing(self) -> bool {
        self != MenuMode::Top
    }
}

// ── GeneratorState ───────────────────────────────────────────────────────

/// The generator's complete user-facing state.
///
/// Created once at startup with [`GeneratorState::new()`] and mutated only
/// by the control loop, through [`menu::handle_event`](crate::menu::handle_event)
/// or the validated setters below. The sample table is **not** stored here;
/// [`Generator`](crate::Generator) derives it from this state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GeneratorState {
    waveform: Waveform,
    frequency_hz: u32,
    unit: DisplayUnit,
    percent: Percent,
    pub(crate) menu_mode: MenuMode,
    pub(crate) cursor: Slot,
    pub(crate) transmitting: bool,
}

impl Default for GeneratorState {
    fn default() -> Self {
        Self::new()
    }
}

impl GeneratorState {
    /// Power-on state: sine, 100 kHz, 50 %, top menu, cursor on the
    /// waveform slot, output stopped.
    pub fn new() -> Self {
        Self {
            waveform: Waveform::Sine,
            frequency_hz: DEFAULT_FREQUENCY_HZ,
            unit: DisplayUnit::KiloHertz,
            percent: Percent::DEFAULT,
            menu_mode: MenuMode::Top,
            cursor: Slot::Waveform,
            transmitting: false,
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    /// Output frequency in Hz, independent of the display unit.
    pub fn frequency_hz(&self) -> u32 {
        self.frequency_hz
    }

    pub fn unit(&self) -> DisplayUnit {
        self.unit
    }

    pub fn percent(&self) -> Percent {
        self.percent
    }

    pub fn menu_mode(&self) -> MenuMode {
        self.menu_mode
    }

    pub fn cursor(&self) -> Slot {
        self.cursor
    }

    /// Cursor as an index 0–6.
    pub fn cursor_position(&self) -> usize {
        self.cursor.index()
    }

    pub fn is_transmitting(&self) -> bool {
        self.transmitting
    }

    /// The number shown on screen, in the active unit.
    pub fn displayed_value(&self) -> u32 {
        self.frequency_hz / self.unit.scale()
    }

    /// The three frequency digits as drawn, most significant first.
    ///
    /// Leading zeros are blanked: the hundreds digit is hidden when zero,
    /// the tens digit when both it and the hundreds digit are zero. The
    /// ones digit is always shown.
    pub fn frequency_digits(&self) -> [Option<u8>; 3] {
        let hundreds = Digit::Hundreds.value_of(self.frequency_hz, self.unit);
        let tens = Digit::Tens.value_of(self.frequency_hz, self.unit);
        let ones = Digit::Ones.value_of(self.frequency_hz, self.unit);

        [
            (hundreds != 0).then_some(hundreds),
            (hundreds != 0 || tens != 0).then_some(tens),
            Some(ones),
        ]
    }

    // ── Validated setters ────────────────────────────────────────────

    /// Set frequency and unit together.
    ///
    /// Returns [`GeneratorError::FrequencyOutOfRange`] (leaving the state
    /// unchanged) if `hz` cannot be shown exactly in `unit`.
    pub fn set_frequency(&mut self, hz: u32, unit: DisplayUnit) -> Result<(), GeneratorError> {
        if !unit.represents(hz) {
            return Err(GeneratorError::FrequencyOutOfRange);
        }
        self.frequency_hz = hz;
        self.unit = unit;
        Ok(())
    }

    /// Change the waveform and reset the percentage to its default.
    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
        self.percent = Percent::DEFAULT;
    }

    pub fn set_percent(&mut self, percent: Percent) {
        self.percent = percent;
    }

    /// Switch between Hz and kHz, rescaling the stored frequency so the
    /// displayed digits stay the same (100 kHz ↔ 100 Hz).
    pub(crate) fn toggle_unit(&mut self) {
        self.frequency_hz = match self.unit {
            DisplayUnit::KiloHertz => self.frequency_hz / 1000,
            DisplayUnit::Hertz => self.frequency_hz * 1000,
        };
        self.unit = self.unit.toggled();
    }
}

// ── Unit Tests ───────────────────────────────────────────────────────────
