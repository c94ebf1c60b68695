//! Sample-table synthesis.
//!
//! A sample table holds one full period of the output as 12-bit DAC codes.
//! Its length is chosen by the [rate controller](crate::rate); this module
//! only fills it.
//!
//! ```text
//! Sine     code[i] = round((sin(2π·i/n) + 1) · 2047.5)
//! Square   code[i] = 4095 while i < p/100 · n, else 0
//! Ramp     rising  : round(p/100 · n) samples, 4095/rising per step, ends at 4095
//!          falling : the rest,          4095/falling per step, ends at 0
//! ```
//!
//! Synthesis is a pure function of its inputs.

use core::f64::consts::TAU;

use heapless::Vec;

use crate::config::{DAC_MAX_CODE, MAX_SAMPLES_PER_PERIOD};
use crate::state::{Percent, Waveform};

/// One period of output samples.
pub type SampleTable = Vec<u16, MAX_SAMPLES_PER_PERIOD>;

/// Build a fresh table of `sample_count` samples.
///
/// `sample_count` is capped at [`MAX_SAMPLES_PER_PERIOD`].
///
/// # Examples
///
/// ```
/// use wavegen::{synthesize, Percent, Waveform};
///
/// let table = synthesize(Waveform::Square, Percent::saturating(30), 10);
/// assert_eq!(&table[..], &[4095, 4095, 4095, 0, 0, 0, 0, 0, 0, 0]);
/// ```
pub fn synthesize(waveform: Waveform, percent: Percent, sample_count: usize) -> SampleTable {
    let mut table = SampleTable::new();
    synthesize_into(&mut table, waveform, percent, sample_count);
    table
}

/// Regenerate `table` in place, replacing its whole contents.
pub fn synthesize_into(
    table: &mut SampleTable,
    waveform: Waveform,
    percent: Percent,
    sample_count: usize,
) {
    let n = sample_count.min(MAX_SAMPLES_PER_PERIOD);
    table.clear();

    match waveform {
        Waveform::Sine => table.extend((0..n).map(|i| sine_code(i, n))),
        Waveform::Square => {
            let high_area = percent.get() as usize * n;
            table.extend((0..n).map(|i| if i * 100 < high_area { DAC_MAX_CODE } else { 0 }));
        }
        Waveform::Ramp => fill_ramp(table, percent, n),
    }
}

fn sine_code(i: usize, n: usize) -> u16 {
    let phase = TAU * i as f64 / n as f64;
    libm::round((libm::sin(phase) + 1.0) * (DAC_MAX_CODE as f64 / 2.0)) as u16
}

fn fill_ramp(table: &mut SampleTable, percent: Percent, n: usize) {
    if n == 0 {
        return;
    }

    // Percent is 10–90, so with n >= 10 both segments are non-empty; the
    // clamp only matters for tiny tables requested directly.
    let rising = ((percent.get() as usize * n + 50) / 100).clamp(1, n);
    let falling = n - rising;
    let full = DAC_MAX_CODE as usize;

    table.extend((1..=rising).map(|k| ((k * full + rising / 2) / rising) as u16));
    table.extend((1..=falling).map(|k| (full - (k * full + falling / 2) / falling) as u16));
}

// ── Unit Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const SIZES: [usize; 8] = [4000, 2000, 1000, 500, 250, 100, 50, 10];
    const WAVES: [Waveform; 3] = [Waveform::Sine, Waveform::Square, Waveform::Ramp];

    fn all_percents() -> impl Iterator<Item = Percent> {
        (1..=9).map(|p| Percent::saturating(p * 10))
    }

    // ── General properties ───────────────────────────────────────────

    #[test]
    fn length_matches_sample_count() {
        for n in SIZES {
            for w in WAVES {
                assert_eq!(synthesize(w, Percent::DEFAULT, n).len(), n);
            }
        }
    }

    #[test]
    fn sample_count_is_capped() {
        let table = synthesize(Waveform::Sine, Percent::DEFAULT, MAX_SAMPLES_PER_PERIOD + 1);
        assert_eq!(table.len(), MAX_SAMPLES_PER_PERIOD);
    }

    #[test]
    fn synthesis_is_deterministic() {
        for n in SIZES {
            for w in WAVES {
                for p in all_percents() {
                    assert_eq!(synthesize(w, p, n), synthesize(w, p, n));
                }
            }
        }
    }

    #[test]
    fn codes_stay_in_dac_range() {
        for n in SIZES {
            for w in WAVES {
                for p in all_percents() {
                    let table = synthesize(w, p, n);
                    assert!(table.iter().all(|&c| c <= DAC_MAX_CODE), "{:?} {} {}", w, p.get(), n);
                }
            }
        }
    }

    #[test]
    fn regenerating_in_place_replaces_contents() {
        let mut table = synthesize(Waveform::Sine, Percent::DEFAULT, 4000);
        synthesize_into(&mut table, Waveform::Square, Percent::DEFAULT, 10);
        assert_eq!(table, synthesize(Waveform::Square, Percent::DEFAULT, 10));
    }

    // ── Sine ─────────────────────────────────────────────────────────

    #[test]
    fn sine_hits_key_points() {
        let table = synthesize(Waveform::Sine, Percent::DEFAULT, 100);
        assert_eq!(table[0], 2048);
        assert_eq!(table[25], 4095);
        assert_eq!(table[75], 0);
    }

    #[test]
    fn sine_ignores_percent() {
        assert_eq!(
            synthesize(Waveform::Sine, Percent::MIN, 250),
            synthesize(Waveform::Sine, Percent::MAX, 250)
        );
    }

    // ── Square ───────────────────────────────────────────────────────

    #[test]
    fn square_duty_matches_percent() {
        for n in SIZES {
            for p in all_percents() {
                let table = synthesize(Waveform::Square, p, n);
                let high = table.iter().filter(|&&c| c == DAC_MAX_CODE).count() as i64;
                let expected = (p.get() as i64 * n as i64 + 50) / 100;
                assert!((high - expected).abs() <= 1, "p={} n={} high={}", p.get(), n, high);
                assert!(table.iter().all(|&c| c == 0 || c == DAC_MAX_CODE));
            }
        }
    }

    #[test]
    fn square_is_high_then_low() {
        let table = synthesize(Waveform::Square, Percent::saturating(70), 100);
        assert!(table[..70].iter().all(|&c| c == DAC_MAX_CODE));
        assert!(table[70..].iter().all(|&c| c == 0));
    }

    // ── Ramp ─────────────────────────────────────────────────────────

    #[test]
    fn ramp_segments_are_monotonic() {
        for n in SIZES {
            for p in all_percents() {
                let table = synthesize(Waveform::Ramp, p, n);
                let rising = (p.get() as usize * n + 50) / 100;

                assert!(table[..rising].windows(2).all(|w| w[0] <= w[1]), "rise p={} n={}", p.get(), n);
                assert!(table[rising..].windows(2).all(|w| w[0] >= w[1]), "fall p={} n={}", p.get(), n);
            }
        }
    }

    #[test]
    fn ramp_peaks_at_symmetry_point_and_ends_at_zero() {
        let table = synthesize(Waveform::Ramp, Percent::saturating(20), 50);
        assert_eq!(table[9], DAC_MAX_CODE);
        assert_eq!(table[49], 0);
        assert_eq!(*table.iter().max().unwrap(), DAC_MAX_CODE);
    }

    #[test]
    fn ramp_shortest_table_has_both_segments() {
        let table = synthesize(Waveform::Ramp, Percent::MIN, 10);
        assert_eq!(table[0], DAC_MAX_CODE);
        assert_eq!(table[9], 0);

        let table = synthesize(Waveform::Ramp, Percent::MAX, 10);
        assert_eq!(table[8], DAC_MAX_CODE);
        assert_eq!(table[9], 0);
    }

    #[test]
    fn ramp_tiny_tables_do_not_divide_by_zero() {
        assert_eq!(&synthesize(Waveform::Ramp, Percent::MIN, 1)[..], &[DAC_MAX_CODE]);
        assert!(synthesize(Waveform::Ramp, Percent::MIN, 0).is_empty());
    }
}
