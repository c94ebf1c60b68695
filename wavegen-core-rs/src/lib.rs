//! Control core of a single-channel function generator.
//!
//! This crate holds everything that decides **what** the generator outputs
//! and **when**: the sample-table synthesizer, the frequency → buffer-size
//! and timer-period mapping, the encoder/button debouncer, and the menu
//! state machine that ties them together. Drawing pixels and driving the
//! DAC/timer/DMA hardware are left to collaborators.
//!
//! # Architecture
//!
//! ```text
//! encoder ISR ──► RotationSlot ─┐
//! button level ─────────────────┼─► InputDebouncer ──► MenuEvent
//!                               │                          │
//!                               │                          ▼
//!                               │          menu::handle_event(&mut GeneratorState)
//!                               │                          │ Effects
//!                               │                          ▼
//!                               └──────────────► Generator ──► OutputSink
//!                                                 (RateController + SampleTable)
//! ```
//!
//! [`GeneratorState`] is the single owned aggregate. It is passed by
//! reference into every call; nothing in this crate keeps hidden statics.
//!
//! # `no_std` Compatibility
//!
//! No heap allocation. The sample table is a fixed-capacity
//! [`heapless::Vec`] sized by [`config::MAX_SAMPLES_PER_PERIOD`] and the
//! timer-period table is a fixed array built once at startup. The optional
//! `defmt` feature enables structured logging for embedded targets.
//!
//! # Quick start
//!
//! ```
//! use wavegen::{Generator, GeneratorState, MenuEvent, OutputSink, TimerClock};
//!
//! struct NullSink;
//! impl OutputSink for NullSink {
//!     type Error = ();
//!     fn start(&mut self, _samples: &[u16], _reload: u32) -> Result<(), ()> { Ok(()) }
//!     fn stop(&mut self) -> Result<(), ()> { Ok(()) }
//! }
//!
//! let mut state = GeneratorState::new();
//! let mut generator = Generator::new(NullSink, TimerClock::default());
//! generator.start_up(&mut state).unwrap();
//! assert_eq!(generator.table().len(), 100); // 100 kHz → 100 samples
//!
//! generator.handle(&mut state, MenuEvent::Click).unwrap();
//! ```

#![no_std]

pub mod config;
pub mod error;
pub mod generator;
pub mod input;
pub mod menu;
pub mod rate;
pub mod state;
pub mod synth;

pub use error::{GeneratorError, OutputError};
pub use generator::{Generator, OutputSink};
pub use input::{
    ButtonDebouncer, Direction, InputDebouncer, PolledInput, QuadratureDecoder, RotationSlot,
};
pub use menu::{handle_event, Effect, Effects, MenuEvent};
pub use rate::{sample_count_for, RateController, RatePlan, TimerClock, TimerPeriodTable};
pub use state::{Digit, DisplayUnit, GeneratorState, MenuMode, Percent, Slot, Waveform};
pub use synth::{synthesize, synthesize_into, SampleTable};
