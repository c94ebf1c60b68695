//! Frequency → sample count and timer period.
//!
//! The output sample rate is `frequency × sample_count`, paced by a
//! hardware timer that fires every `reload + 1` ticks of its input clock.
//! Two static tables keep the three quantities consistent:
//!
//! - **Bands** trade table depth for reachable frequency: the higher the
//!   frequency, the fewer samples per period.
//! - **Timer periods** map every representable frequency to its reload
//!   value. The table is computed once at startup from a [`TimerClock`]
//!   and then only indexed.
//!
//! | Upper bound (Hz, inclusive) | Samples |
//! |----------------------------:|--------:|
//! | 250                         | 4000    |
//! | 500                         | 2000    |
//! | 5 000                       | 1000    |
//! | 10 000                      | 500     |
//! | 20 000                      | 250     |
//! | 100 000                     | 100     |
//! | 200 000                     | 50      |
//! | 999 000                     | 10      |

use crate::config::{MAX_FREQUENCY_HZ, MIN_FREQUENCY_HZ};
use crate::error::GeneratorError;
use crate::state::GeneratorState;

/// Frequency bands as `(inclusive upper bound in Hz, samples per period)`.
pub const SAMPLE_BANDS: [(u32, u16); 8] = [
    (250, 4000),
    (500, 2000),
    (5_000, 1000),
    (10_000, 500),
    (20_000, 250),
    (100_000, 100),
    (200_000, 50),
    (MAX_FREQUENCY_HZ, 10),
];

/// Frequencies below 1 kHz, addressed in Hz.
const HZ_ENTRIES: usize = 999;
/// Frequencies from 1 kHz upward, addressed in whole kHz.
const KHZ_ENTRIES: usize = 999;

/// Number of entries in a [`TimerPeriodTable`].
pub const TIMER_PERIOD_ENTRIES: usize = HZ_ENTRIES + KHZ_ENTRIES;

/// Samples per period for `hz`.
///
/// ```
/// use wavegen::sample_count_for;
///
/// assert_eq!(sample_count_for(250), 4000);
/// assert_eq!(sample_count_for(251), 2000);
/// assert_eq!(sample_count_for(999_000), 10);
/// ```
pub fn sample_count_for(hz: u32) -> u16 {
    SAMPLE_BANDS
        .iter()
        .find(|(upper, _)| hz <= *upper)
        .map_or(SAMPLE_BANDS[SAMPLE_BANDS.len() - 1].1, |&(_, samples)| samples)
}

// ── TimerClock ───────────────────────────────────────────────────────────

/// Input clock of the sample-rate timer.
///
/// The timer counts at `clock_hz / (prescaler + 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerClock {
    /// Peripheral clock feeding the timer. Default: 150 MHz.
    pub clock_hz: u32,
    /// Prescaler register value. Default: 0.
    pub prescaler: u32,
}

impl Default for TimerClock {
    fn default() -> Self {
        Self {
            clock_hz: 150_000_000,
            prescaler: 0,
        }
    }
}

impl TimerClock {
    /// Reload value that makes the timer fire `sample_rate` times a
    /// second, rounded to the nearest tick and never below zero.
    pub fn reload_for(&self, sample_rate: u64) -> u32 {
        let tick_hz = self.clock_hz as u64 / (self.prescaler as u64 + 1);
        let ticks = (tick_hz + sample_rate / 2) / sample_rate.max(1);
        ticks.saturating_sub(1).min(u32::MAX as u64) as u32
    }
}

// ── TimerPeriodTable ─────────────────────────────────────────────────────

/// Reload value for every representable output frequency.
///
/// Entries 0–998 cover 1–999 Hz, entries 999–1997 cover 1–999 kHz.
pub struct TimerPeriodTable {
    reloads: [u32; TIMER_PERIOD_ENTRIES],
}

impl TimerPeriodTable {
    /// Compute the table for `clock`, using each frequency's band depth.
    pub fn new(clock: TimerClock) -> Self {
        let mut reloads = [0u32; TIMER_PERIOD_ENTRIES];

        for (idx, reload) in reloads.iter_mut().enumerate() {
            let hz = Self::frequency_at(idx);
            let sample_rate = hz as u64 * sample_count_for(hz) as u64;
            *reload = clock.reload_for(sample_rate);
        }

        Self { reloads }
    }

    /// Reload value for `hz`, or `None` if `hz` is not representable.
    pub fn reload_for(&self, hz: u32) -> Option<u32> {
        Self::index_of(hz).map(|idx| self.reloads[idx])
    }

    pub fn len(&self) -> usize {
        self.reloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reloads.is_empty()
    }

    fn index_of(hz: u32) -> Option<usize> {
        match hz {
            MIN_FREQUENCY_HZ..=999 => Some(hz as usize - 1),
            1_000..=MAX_FREQUENCY_HZ if hz % 1000 == 0 => Some(HZ_ENTRIES + hz as usize / 1000 - 1),
            _ => None,
        }
    }

    fn frequency_at(idx: usize) -> u32 {
        if idx < HZ_ENTRIES {
            idx as u32 + 1
        } else {
            (idx - HZ_ENTRIES + 1) as u32 * 1000
        }
    }
}

// ── RateController ───────────────────────────────────────────────────────

/// Sample count and timer reload chosen for one frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RatePlan {
    pub sample_count: u16,
    pub timer_reload: u32,
}

/// Plans the buffer depth and timer period for the current state.
pub struct RateController {
    periods: TimerPeriodTable,
}

impl RateController {
    pub fn new(clock: TimerClock) -> Self {
        Self {
            periods: TimerPeriodTable::new(clock),
        }
    }

    /// Plan the output for `state`'s frequency.
    ///
    /// # Errors
    /// [`GeneratorError::NoTimerPeriod`] if the frequency has no table
    /// entry, which the state's own validation should make impossible.
    pub fn apply_frequency(&self, state: &GeneratorState) -> Result<RatePlan, GeneratorError> {
        let hz = state.frequency_hz();
        let timer_reload = self
            .periods
            .reload_for(hz)
            .ok_or(GeneratorError::NoTimerPeriod)?;

        Ok(RatePlan {
            sample_count: sample_count_for(hz),
            timer_reload,
        })
    }

    pub fn periods(&self) -> &TimerPeriodTable {
        &self.periods
    }
}

// ── Unit Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::DisplayUnit;

    // ── Bands ────────────────────────────────────────────────────────

    #[test]
    fn band_edges() {
        let cases = [
            (1, 4000),
            (250, 4000),
            (251, 2000),
            (500, 2000),
            (501, 1000),
            (5_000, 1000),
            (5_001, 500),
            (10_000, 500),
            (10_001, 250),
            (20_000, 250),
            (20_001, 100),
            (100_000, 100),
            (100_001, 50),
            (200_000, 50),
            (200_001, 10),
            (999_000, 10),
        ];
        for (hz, samples) in cases {
            assert_eq!(sample_count_for(hz), samples, "{} Hz", hz);
        }
    }

    #[test]
    fn bands_are_ascending_and_shrinking() {
        for pair in SAMPLE_BANDS.windows(2) {
            assert!(pair[0].0 < pair[1].0);
            assert!(pair[0].1 > pair[1].1);
        }
    }

    // ── TimerClock ───────────────────────────────────────────────────

    #[test]
    fn reload_rounds_to_nearest_tick() {
        let clock = TimerClock {
            clock_hz: 100_000_000,
            prescaler: 0,
        };
        assert_eq!(clock.reload_for(1_000_000), 99);
        // 100 MHz / 3 MHz = 33.3 ticks → 33 → reload 32
        assert_eq!(clock.reload_for(3_000_000), 32);
    }

    #[test]
    fn reload_respects_prescaler() {
        let clock = TimerClock {
            clock_hz: 100_000_000,
            prescaler: 9,
        };
        assert_eq!(clock.reload_for(1_000_000), 9);
    }

    #[test]
    fn reload_never_underflows() {
        let clock = TimerClock {
            clock_hz: 1_000,
            prescaler: 0,
        };
        assert_eq!(clock.reload_for(10_000_000), 0);
    }

    // ── TimerPeriodTable ─────────────────────────────────────────────

    #[test]
    fn table_covers_every_representable_frequency() {
        let table = TimerPeriodTable::new(TimerClock::default());
        assert_eq!(table.len(), TIMER_PERIOD_ENTRIES);

        for hz in 1..=999 {
            assert!(table.reload_for(hz).is_some(), "{} Hz", hz);
            assert!(table.reload_for(hz * 1000).is_some(), "{} kHz", hz);
        }
    }

    #[test]
    fn table_rejects_unrepresentable_frequencies() {
        let table = TimerPeriodTable::new(TimerClock::default());
        assert_eq!(table.reload_for(0), None);
        assert_eq!(table.reload_for(1_500), None);
        assert_eq!(table.reload_for(1_000_000), None);
    }

    #[test]
    fn index_and_frequency_agree() {
        for idx in 0..TIMER_PERIOD_ENTRIES {
            let hz = TimerPeriodTable::frequency_at(idx);
            assert_eq!(TimerPeriodTable::index_of(hz), Some(idx));
        }
    }

    #[test]
    fn table_entries_match_clock_formula() {
        let clock = TimerClock::default();
        let table = TimerPeriodTable::new(clock);

        // 100 kHz × 100 samples = 10 MHz → 150 MHz / 10 MHz = 15 ticks.
        assert_eq!(table.reload_for(100_000), Some(14));
        // 1 Hz × 4000 samples = 4 kHz → 37 500 ticks.
        assert_eq!(table.reload_for(1), Some(37_499));
    }

    // ── RateController ───────────────────────────────────────────────

    #[test]
    fn apply_frequency_plans_default_state() {
        let rate = RateController::new(TimerClock::default());
        let plan = rate.apply_frequency(&GeneratorState::new()).unwrap();
        assert_eq!(plan.sample_count, 100);
        assert_eq!(plan.timer_reload, 14);
    }

    #[test]
    fn apply_frequency_uses_raw_hz() {
        let rate = RateController::new(TimerClock::default());
        let mut state = GeneratorState::new();
        state.set_frequency(250, DisplayUnit::Hertz).unwrap();

        let plan = rate.apply_frequency(&state).unwrap();
        assert_eq!(plan.sample_count, 4000);
        assert_eq!(Some(plan.timer_reload), rate.periods().reload_for(250));
    }
}
