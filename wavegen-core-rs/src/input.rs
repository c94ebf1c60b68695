//! Rotary encoder and push-button debouncing.
//!
//! Raw input arrives from two sides:
//!
//! - **Encoder transitions** are posted asynchronously by an interrupt
//!   source into a [`RotationSlot`]. The interrupt only adds to a signed
//!   half-step count; the control loop takes it with a single atomic swap,
//!   which is the one synchronization point between the two.
//! - **Button levels** are sampled by the control loop itself.
//!
//! [`InputDebouncer::poll()`] turns one polling cycle's worth of raw input
//! into at most one tick and at most one click.

use core::sync::atomic::{AtomicI8, Ordering};

use crate::config::{HALF_STEPS_PER_TICK, SWITCH_DEBOUNCE_MS};

/// Rotation direction of a half-step or tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Clockwise,
    CounterClockwise,
}

impl Direction {
    fn as_raw(self) -> i8 {
        match self {
            Direction::Clockwise => 1,
            Direction::CounterClockwise => -1,
        }
    }

    fn of_count(count: i8) -> Option<Self> {
        match count.signum() {
            1 => Some(Direction::Clockwise),
            -1 => Some(Direction::CounterClockwise),
            _ => None,
        }
    }
}

// ── RotationSlot ─────────────────────────────────────────────────────────

/// Half-step counter shared by the encoder interrupt and the control loop.
///
/// Holds the signed sum of half-steps posted since the last take
/// (positive = clockwise). Posts between two takes accumulate, saturating
/// at the `i8` range, so none are lost when the encoder outruns the poll.
///
/// # Example
///
/// ```
/// use wavegen::{Direction, RotationSlot};
///
/// static ROTATION: RotationSlot = RotationSlot::new();
///
/// // interrupt context
/// ROTATION.post(Direction::Clockwise);
/// ROTATION.post(Direction::Clockwise);
///
/// // control loop
/// assert_eq!(ROTATION.take(), 2);
/// assert_eq!(ROTATION.take(), 0);
/// ```
pub struct RotationSlot {
    pending: AtomicI8,
}

impl Default for RotationSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl RotationSlot {
    pub const fn new() -> Self {
        Self {
            pending: AtomicI8::new(0),
        }
    }

    /// Record a half-step. Safe to call from interrupt context.
    pub fn post(&self, direction: Direction) {
        let step = direction.as_raw();
        // The closure always returns `Some`, so this cannot fail.
        let _ = self
            .pending
            .fetch_update(Ordering::AcqRel, Ordering::Relaxed, |n| {
                Some(n.saturating_add(step))
            });
    }

    /// Read and clear the pending half-step count in one atomic exchange.
    pub fn take(&self) -> i8 {
        self.pending.swap(0, Ordering::AcqRel)
    }
}

// ── QuadratureDecoder ────────────────────────────────────────────────────

/// Turns encoder half-steps into detent ticks.
///
/// Two consecutive half-steps in the same direction fire one tick. A
/// half-step in the opposite direction cancels a pending partial step
/// instead of starting one, so one forward step, two back and three
/// forward produce exactly one clockwise tick, on the last step.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuadratureDecoder {
    /// Signed count of pending half-steps, always in
    /// `(-HALF_STEPS_PER_TICK, HALF_STEPS_PER_TICK)`.
    partial: i8,
}

impl QuadratureDecoder {
    pub const fn new() -> Self {
        Self { partial: 0 }
    }

    /// Feed one half-step; returns a tick when a full detent completes.
    pub fn feed(&mut self, direction: Direction) -> Option<Direction> {
        let step = direction.as_raw();
        let next = self.partial + step;

        if next.abs() >= HALF_STEPS_PER_TICK {
            self.partial = 0;
            Some(direction)
        } else if self.partial != 0 && self.partial.signum() != step {
            // Reversal mid-detent.
            self.partial = 0;
            None
        } else {
            self.partial = next;
            None
        }
    }

    /// Pending half-steps (negative = counter-clockwise).
    pub fn partial(&self) -> i8 {
        self.partial
    }
}

// ── ButtonDebouncer ──────────────────────────────────────────────────────

/// Detects debounced presses of an active-low push button.
///
/// A press is the falling edge of the raw level. It counts as a click
/// only if at least [`SWITCH_DEBOUNCE_MS`] has passed since the previous
/// level transition; every transition, accepted or not, restarts that
/// interval.
#[derive(Debug, Clone, Copy)]
pub struct ButtonDebouncer {
    /// Last sampled raw level (`true` = high = released).
    last_level: bool,
    /// Time of the last level transition, `None` until the first one.
    last_transition_ms: Option<u64>,
    debounce_ms: u64,
}

impl Default for ButtonDebouncer {
    fn default() -> Self {
        Self::new()
    }
}

impl ButtonDebouncer {
    /// Debouncer for a released button with the default interval.
    pub const fn new() -> Self {
        Self::with_interval(SWITCH_DEBOUNCE_MS)
    }

    pub const fn with_interval(debounce_ms: u64) -> Self {
        Self {
            last_level: true,
            last_transition_ms: None,
            debounce_ms,
        }
    }

    /// Sample the raw level at `now_ms`; returns `true` for a click.
    pub fn sample(&mut self, level_high: bool, now_ms: u64) -> bool {
        if level_high == self.last_level {
            return false;
        }

        let settled = match self.last_transition_ms {
            Some(t) => now_ms.saturating_sub(t) >= self.debounce_ms,
            None => true,
        };
        let pressed = self.last_level && !level_high;

        self.last_level = level_high;
        self.last_transition_ms = Some(now_ms);

        pressed && settled
    }
}

// ── InputDebouncer ───────────────────────────────────────────────────────

/// Debounced input for one polling cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PolledInput {
    pub tick: Option<Direction>,
    pub click: bool,
}

/// Encoder and button debouncing combined.
///
/// Half-steps left over once a cycle has produced its tick are kept and
/// fed on the following polls.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputDebouncer {
    decoder: QuadratureDecoder,
    button: ButtonDebouncer,
    /// Half-steps taken but not yet fed to the decoder.
    backlog: i8,
}

impl InputDebouncer {
    pub const fn new() -> Self {
        Self {
            decoder: QuadratureDecoder::new(),
            button: ButtonDebouncer::new(),
            backlog: 0,
        }
    }

    /// Process one polling cycle.
    ///
    /// # Arguments
    /// * `half_steps` — the count taken from the [`RotationSlot`]
    /// * `button_high` — raw button level (`true` = released)
    /// * `now_ms` — monotonic timestamp of this poll
    pub fn poll(&mut self, half_steps: i8, button_high: bool, now_ms: u64) -> PolledInput {
        self.backlog = self.backlog.saturating_add(half_steps);

        let mut tick = None;
        while let Some(direction) = Direction::of_count(self.backlog) {
            self.backlog -= direction.as_raw();
            tick = self.decoder.feed(direction);
            if tick.is_some() {
                break;
            }
        }

        PolledInput {
            tick,
            click: self.button.sample(button_high, now_ms),
        }
    }
}

// ── Unit Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    use Direction::{Clockwise as Cw, CounterClockwise as Ccw};

    // ── RotationSlot ─────────────────────────────────────────────────

    #[test]
    fn slot_take_clears() {
        let slot = RotationSlot::new();
        assert_eq!(slot.take(), 0);

        slot.post(Ccw);
        assert_eq!(slot.take(), -1);
        assert_eq!(slot.take(), 0);
    }

    #[test]
    fn slot_accumulates_posts() {
        let slot = RotationSlot::new();
        slot.post(Cw);
        slot.post(Cw);
        slot.post(Ccw);
        assert_eq!(slot.take(), 1);
    }

    #[test]
    fn slot_saturates() {
        let slot = RotationSlot::new();
        for _ in 0..200 {
            slot.post(Cw);
        }
        assert_eq!(slot.take(), i8::MAX);
    }

    // ── QuadratureDecoder ────────────────────────────────────────────

    #[test]
    fn two_half_steps_same_direction_fire_one_tick() {
        let mut d = QuadratureDecoder::new();
        assert_eq!(d.feed(Cw), None);
        assert_eq!(d.feed(Cw), Some(Cw));
        assert_eq!(d.partial(), 0);

        assert_eq!(d.feed(Ccw), None);
        assert_eq!(d.feed(Ccw), Some(Ccw));
    }

    #[test]
    fn opposite_half_steps_fire_nothing() {
        let mut d = QuadratureDecoder::new();
        assert_eq!(d.feed(Cw), None);
        assert_eq!(d.feed(Ccw), None);
        assert_eq!(d.partial(), 0);
    }

    #[test]
    fn reversal_resets_rather_than_counting() {
        // Forward one, back two, forward three: one tick, on the last step.
        let mut d = QuadratureDecoder::new();
        let steps = [Cw, Ccw, Ccw, Cw, Cw, Cw];
        let ticks: [Option<Direction>; 6] = core::array::from_fn(|i| d.feed(steps[i]));
        assert_eq!(ticks, [None, None, None, None, None, Some(Cw)]);
    }

    // ── ButtonDebouncer ──────────────────────────────────────────────

    #[test]
    fn first_press_is_a_click() {
        let mut b = ButtonDebouncer::new();
        assert!(!b.sample(true, 0));
        assert!(b.sample(false, 5));
    }

    #[test]
    fn holding_does_not_repeat() {
        let mut b = ButtonDebouncer::new();
        assert!(b.sample(false, 100));
        assert!(!b.sample(false, 200));
        assert!(!b.sample(false, 300));
    }

    #[test]
    fn release_is_not_a_click() {
        let mut b = ButtonDebouncer::new();
        b.sample(false, 100);
        assert!(!b.sample(true, 400));
    }

    #[test]
    fn bounce_within_interval_is_ignored() {
        let mut b = ButtonDebouncer::new();
        assert!(b.sample(false, 1_000));
        assert!(!b.sample(true, 1_002));
        // Bounce back low 3 ms after the release.
        assert!(!b.sample(false, 1_005));
    }

    #[test]
    fn press_after_interval_is_accepted() {
        let mut b = ButtonDebouncer::new();
        assert!(b.sample(false, 1_000));
        assert!(!b.sample(true, 1_200));
        assert!(b.sample(false, 1_200 + SWITCH_DEBOUNCE_MS));
    }

    // ── InputDebouncer ───────────────────────────────────────────────

    #[test]
    fn poll_emits_at_most_one_of_each() {
        let mut input = InputDebouncer::new();
        assert_eq!(input.poll(1, true, 0), PolledInput::default());

        let polled = input.poll(1, false, 1);
        assert_eq!(polled.tick, Some(Cw));
        assert!(polled.click);

        assert_eq!(input.poll(0, false, 2), PolledInput::default());
    }

    /// Polls `input` until `slot` and the backlog are drained, counting ticks.
    fn drain(input: &mut InputDebouncer, slot: &RotationSlot) -> [usize; 2] {
        let mut ticks = [0; 2];
        for ms in 0..10 {
            match input.poll(slot.take(), true, ms).tick {
                Some(Cw) => ticks[0] += 1,
                Some(Ccw) => ticks[1] += 1,
                None => {}
            }
        }
        ticks
    }

    #[test]
    fn two_half_steps_in_one_window_fire_one_tick() {
        let slot = RotationSlot::new();
        let mut input = InputDebouncer::new();

        slot.post(Cw);
        slot.post(Cw);
        assert_eq!(drain(&mut input, &slot), [1, 0]);
    }

    #[test]
    fn opposite_half_steps_in_one_window_fire_nothing() {
        let slot = RotationSlot::new();
        let mut input = InputDebouncer::new();

        slot.post(Cw);
        slot.post(Ccw);
        assert_eq!(drain(&mut input, &slot), [0, 0]);
    }

    #[test]
    fn fast_spin_spreads_ticks_over_polls() {
        let slot = RotationSlot::new();
        let mut input = InputDebouncer::new();

        for _ in 0..6 {
            slot.post(Ccw);
        }
        assert_eq!(input.poll(slot.take(), true, 0).tick, Some(Ccw));
        assert_eq!(input.poll(slot.take(), true, 1).tick, Some(Ccw));
        assert_eq!(input.poll(slot.take(), true, 2).tick, Some(Ccw));
        assert_eq!(input.poll(slot.take(), true, 3).tick, None);
    }
}
