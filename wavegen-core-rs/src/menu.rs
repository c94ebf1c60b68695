//! Menu / edit state machine.
//!
//! [`handle_event()`] is the transition function: it applies one debounced
//! [`MenuEvent`] to a [`GeneratorState`] and returns the [`Effects`] the
//! caller must carry out. It never touches hardware itself.
//!
//! # States
//!
//! ```text
//!            tick: move cursor (wraps over 7 slots)
//!          ┌──────┐
//!          ▼      │
//!        ┌──────────┐  click on Waveform/Hundreds/Tens/Ones/Percent  ┌────────────┐
//!        │   Top    │ ──────────────────────────────────────────────►│ *Edit      │
//!        │          │◄────────────────────────────────────────────── │ tick: edit │
//!        └──────────┘                   click                        └────────────┘
//!          │  ▲
//!          └──┘ click on Units: toggle Hz/kHz
//!               click on Transmit: start/stop output
//! ```
//!
//! Clicking out of an edit state always lands back on the slot that was
//! being edited.

use heapless::Vec;

use crate::input::Direction;
use crate::state::{Digit, GeneratorState, MenuMode, Slot};

/// One debounced user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MenuEvent {
    Tick(Direction),
    Click,
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Effect {
    /// Frequency changed: re-plan sample count and timer period.
    Retune,
    /// Waveform or percentage changed: the sample table may be stale.
    Reshape,
    /// Begin streaming the sample table.
    StartOutput,
    /// Stop streaming.
    StopOutput,
    /// Something visible changed.
    Redraw,
}

/// Number of distinct [`Effect`] variants.
const EFFECT_KINDS: usize = 5;

/// De-duplicated, ordered list of effects from one transition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Effects {
    items: Vec<Effect, EFFECT_KINDS>,
}

impl Effects {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Append `effect` unless already present.
    pub fn push(&mut self, effect: Effect) {
        if !self.items.contains(&effect) {
            // Capacity equals the number of variants, so this cannot fail.
            let _ = self.items.push(effect);
        }
    }

    pub fn contains(&self, effect: Effect) -> bool {
        self.items.contains(&effect)
    }

    pub fn iter(&self) -> impl Iterator<Item = Effect> + '_ {
        self.items.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

/// Apply `event` to `state` and return the effects to execute.
///
/// # Examples
///
/// ```
/// use wavegen::{handle_event, Direction, Effect, GeneratorState, MenuEvent, MenuMode, Waveform};
///
/// let mut state = GeneratorState::new();
/// handle_event(&mut state, MenuEvent::Click);
/// assert_eq!(state.menu_mode(), MenuMode::WaveformEdit);
///
/// let effects = handle_event(&mut state, MenuEvent::Tick(Direction::Clockwise));
/// assert_eq!(state.waveform(), Waveform::Square);
/// assert!(effects.contains(Effect::Reshape));
/// ```
pub fn handle_event(state: &mut GeneratorState, event: MenuEvent) -> Effects {
    let mut effects = Effects::new();

    match (state.menu_mode, event) {
        (MenuMode::Top, MenuEvent::Tick(direction)) => {
            state.cursor = state.cursor.step(direction);
            effects.push(Effect::Redraw);
        }
        (MenuMode::Top, MenuEvent::Click) => select(state, &mut effects),
        (mode, MenuEvent::Click) => {
            #[cfg(feature = "defmt")]
            defmt::debug!("leaving {}", mode);

            state.menu_mode = MenuMode::Top;
            if let Some(slot) = mode.bound_slot() {
                state.cursor = slot;
            }
            effects.push(Effect::Redraw);
        }
        (MenuMode::WaveformEdit, MenuEvent::Tick(direction)) => {
            let next = state.waveform().step(direction);
            state.set_waveform(next);
            effects.push(Effect::Reshape);
            effects.push(Effect::Redraw);
        }
        (MenuMode::PercentEdit, MenuEvent::Tick(direction)) => {
            let before = state.percent();
            state.set_percent(before.step(direction));
            if state.percent() != before {
                effects.push(Effect::Reshape);
                effects.push(Effect::Redraw);
            }
        }
        (mode, MenuEvent::Tick(direction)) => {
            if let Some(digit) = mode.digit() {
                edit_digit(state, digit, direction, &mut effects);
            }
        }
    }

    effects
}

/// Click in the top menu.
fn select(state: &mut GeneratorState, effects: &mut Effects) {
    match state.cursor {
        Slot::Units => {
            state.toggle_unit();
            effects.push(Effect::Retune);
        }
        Slot::Transmit => {
            state.transmitting = !state.transmitting;
            effects.push(if state.transmitting {
                Effect::StartOutput
            } else {
                Effect::StopOutput
            });
        }
        slot => {
            if let Some(mode) = slot.edit_mode() {
                #[cfg(feature = "defmt")]
                defmt::debug!("entering {}", mode);
                state.menu_mode = mode;
            }
        }
    }
    effects.push(Effect::Redraw);
}

fn edit_digit(
    state: &mut GeneratorState,
    digit: Digit,
    direction: Direction,
    effects: &mut Effects,
) {
    let unit = state.unit();
    match digit.step(state.frequency_hz(), unit, direction) {
        Ok(hz) => {
            // `step` only returns values representable in `unit`.
            if state.set_frequency(hz, unit).is_ok() {
                effects.push(Effect::Retune);
                effects.push(Effect::Redraw);
            }
        }
        Err(_e) => {
            #[cfg(feature = "defmt")]
            defmt::warn!(
                "digit edit rejected: {} Hz {} {}: {}",
                state.frequency_hz(),
                digit,
                direction,
                _e
            );
        }
    }
}

// ── Unit Tests ───────────────────────────────────────────────────────────
