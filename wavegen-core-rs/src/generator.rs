//! Control loop glue: menu effects → sample table → output sink.
//!
//! [`Generator`] owns the sample table and the [`RateController`], and
//! drives an [`OutputSink`] so that while the output is running the sink
//! always streams a table that matches the current [`GeneratorState`].
//!
//! Any change that invalidates the streaming table follows the same order:
//!
//! 1. stop the sink
//! 2. regenerate the table at the new depth
//! 3. reprogram the timer period
//! 4. restart the sink
//!
//! The table is never rewritten while the sink is reading it.

use crate::error::OutputError;
use crate::menu::{handle_event, Effect, Effects, MenuEvent};
use crate::rate::{RateController, RatePlan, TimerClock};
use crate::state::{GeneratorState, Percent, Waveform};
use crate::synth::{synthesize_into, SampleTable};

/// Hardware that streams a sample table to the DAC.
///
/// Implementations pair a DMA-like transfer that loops over `samples`
/// with a timer that requests one sample every `timer_reload + 1` ticks.
pub trait OutputSink {
    type Error;

    /// Start (or restart) streaming `samples` in a loop.
    fn start(&mut self, samples: &[u16], timer_reload: u32) -> Result<(), Self::Error>;

    /// Stop streaming. Must be safe to call while already stopped.
    fn stop(&mut self) -> Result<(), Self::Error>;
}

/// Inputs the sample table was last built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TableKey {
    waveform: Waveform,
    percent: Percent,
    sample_count: u16,
}

impl TableKey {
    fn new(state: &GeneratorState, plan: RatePlan) -> Self {
        // Sine ignores the percentage; normalize so a percent change on a
        // sine never forces a rebuild.
        let percent = if state.waveform().uses_percent() {
            state.percent()
        } else {
            Percent::DEFAULT
        };
        Self {
            waveform: state.waveform(),
            percent,
            sample_count: plan.sample_count,
        }
    }
}

/// Owns the sample table and keeps the output sink consistent with the
/// generator state.
pub struct Generator<S> {
    sink: S,
    rate: RateController,
    table: SampleTable,
    table_key: Option<TableKey>,
    timer_reload: Option<u32>,
}

impl<S: OutputSink> Generator<S> {
    /// Build the timer-period table for `clock`. The sample table stays
    /// empty until [`Generator::start_up`].
    pub fn new(sink: S, clock: TimerClock) -> Self {
        Self {
            sink,
            rate: RateController::new(clock),
            table: SampleTable::new(),
            table_key: None,
            timer_reload: None,
        }
    }

    /// Build the initial table for `state` without starting the output.
    pub fn start_up(&mut self, state: &mut GeneratorState) -> Result<(), OutputError<S::Error>> {
        let plan = self.rate.apply_frequency(state).map_err(OutputError::Rate)?;
        self.rebuild(state, plan);
        self.timer_reload = Some(plan.timer_reload);

        if state.is_transmitting() {
            self.start_sink(state)?;
        }
        Ok(())
    }

    /// Run one menu event through the state machine and execute its
    /// effects.
    pub fn handle(
        &mut self,
        state: &mut GeneratorState,
        event: MenuEvent,
    ) -> Result<Effects, OutputError<S::Error>> {
        let effects = handle_event(state, event);
        self.apply(state, &effects)?;
        Ok(effects)
    }

    /// Execute `effects` produced by [`handle_event`].
    pub fn apply(
        &mut self,
        state: &mut GeneratorState,
        effects: &Effects,
    ) -> Result<(), OutputError<S::Error>> {
        if effects.contains(Effect::StopOutput) {
            self.stop_sink(state)?;
        }

        if effects.contains(Effect::Retune) || effects.contains(Effect::Reshape) {
            self.reconcile(state)?;
        }

        if effects.contains(Effect::StartOutput) {
            self.start_sink(state)?;
        }
        Ok(())
    }

    /// Sample table for the current state.
    pub fn table(&self) -> &[u16] {
        &self.table
    }

    /// Timer reload currently programmed, once planned.
    pub fn timer_reload(&self) -> Option<u32> {
        self.timer_reload
    }

    pub fn rate(&self) -> &RateController {
        &self.rate
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    // ── Internals ────────────────────────────────────────────────────

    /// Bring table and timer period in line with `state`, restarting the
    /// sink around the rebuild if it is streaming.
    fn reconcile(&mut self, state: &mut GeneratorState) -> Result<(), OutputError<S::Error>> {
        let plan = self.rate.apply_frequency(state).map_err(OutputError::Rate)?;
        let stale_table = self.table_key != Some(TableKey::new(state, plan));
        let stale_timer = self.timer_reload != Some(plan.timer_reload);

        if !stale_table && !stale_timer {
            return Ok(());
        }

        // A sink that did not stop may still be reading the table.
        if state.is_transmitting() {
            self.stop_sink(state)?;
        }
        if stale_table {
            self.rebuild(state, plan);
        }
        self.timer_reload = Some(plan.timer_reload);

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "retuned: {} Hz, {} samples, reload {}",
            state.frequency_hz(),
            plan.sample_count,
            plan.timer_reload
        );

        if state.is_transmitting() {
            self.stream(state, plan)?;
        }
        Ok(())
    }

    fn rebuild(&mut self, state: &GeneratorState, plan: RatePlan) {
        synthesize_into(
            &mut self.table,
            state.waveform(),
            state.percent(),
            plan.sample_count as usize,
        );
        self.table_key = Some(TableKey::new(state, plan));
    }

    /// Plan, rebuild if stale, then start streaming.
    fn start_sink(&mut self, state: &mut GeneratorState) -> Result<(), OutputError<S::Error>> {
        let plan = self.rate.apply_frequency(state).map_err(OutputError::Rate)?;
        if self.table_key != Some(TableKey::new(state, plan)) {
            self.rebuild(state, plan);
        }
        self.timer_reload = Some(plan.timer_reload);
        self.stream(state, plan)
    }

    /// Hand the current table to the sink. A sink failure clears the
    /// transmit flag so the panel does not claim an output that is not
    /// running.
    fn stream(
        &mut self,
        state: &mut GeneratorState,
        plan: RatePlan,
    ) -> Result<(), OutputError<S::Error>> {
        match self.sink.start(&self.table, plan.timer_reload) {
            Ok(()) => {
                #[cfg(feature = "defmt")]
                defmt::info!(
                    "output started: {} Hz, {} samples",
                    state.frequency_hz(),
                    plan.sample_count
                );
                Ok(())
            }
            Err(e) => {
                #[cfg(feature = "defmt")]
                defmt::error!("output start failed");
                state.transmitting = false;
                Err(OutputError::Sink(e))
            }
        }
    }

    /// Stop streaming. A sink that fails to stop may still be running, so
    /// the transmit flag is raised again.
    fn stop_sink(&mut self, state: &mut GeneratorState) -> Result<(), OutputError<S::Error>> {
        match self.sink.stop() {
            Ok(()) => {
                #[cfg(feature = "defmt")]
                defmt::info!("output stopped");
                Ok(())
            }
            Err(e) => {
                #[cfg(feature = "defmt")]
                defmt::error!("output stop failed");
                state.transmitting = true;
                Err(OutputError::Sink(e))
            }
        }
    }
}

// ── Unit Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    extern crate std;

    use std::vec::Vec;

    use super::*;
    use crate::input::Direction;
    use crate::rate::sample_count_for;
    use crate::state::{DisplayUnit, Slot};
    use crate::synth::synthesize;

    use Direction::{Clockwise as Cw, CounterClockwise as Ccw};

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Start { samples: Vec<u16>, reload: u32 },
        Stop,
    }

    #[derive(Default)]
    struct RecordingSink {
        calls: Vec<Call>,
        fail_start: bool,
        fail_stop: bool,
    }

    impl OutputSink for RecordingSink {
        type Error = &'static str;

        fn start(&mut self, samples: &[u16], timer_reload: u32) -> Result<(), Self::Error> {
            if self.fail_start {
                return Err("dma busy");
            }
            self.calls.push(Call::Start {
                samples: samples.to_vec(),
                reload: timer_reload,
            });
            Ok(())
        }

        fn stop(&mut self) -> Result<(), Self::Error> {
            if self.fail_stop {
                return Err("dac stuck");
            }
            self.calls.push(Call::Stop);
            Ok(())
        }
    }

    fn setup() -> (Generator<RecordingSink>, GeneratorState) {
        let mut state = GeneratorState::new();
        let mut generator = Generator::new(RecordingSink::default(), TimerClock::default());
        generator.start_up(&mut state).unwrap();
        (generator, state)
    }

    fn drive(
        generator: &mut Generator<RecordingSink>,
        state: &mut GeneratorState,
        events: &[MenuEvent],
    ) {
        for &event in events {
            generator.handle(state, event).unwrap();
        }
    }

    fn move_to(generator: &mut Generator<RecordingSink>, state: &mut GeneratorState, slot: Slot) {
        while state.cursor() != slot {
            generator.handle(state, MenuEvent::Tick(Cw)).unwrap();
        }
    }

    fn start_output(generator: &mut Generator<RecordingSink>, state: &mut GeneratorState) {
        let back = state.cursor();
        move_to(generator, state, Slot::Transmit);
        generator.handle(state, MenuEvent::Click).unwrap();
        move_to(generator, state, back);
        generator.sink_mut().calls.clear();
    }

    // ── Startup ──────────────────────────────────────────────────────

    #[test]
    fn start_up_builds_default_table_without_streaming() {
        let (generator, _state) = setup();
        assert_eq!(generator.table().len(), 100);
        assert_eq!(generator.table(), &synthesize(Waveform::Sine, Percent::DEFAULT, 100)[..]);
        assert_eq!(generator.timer_reload(), Some(14));
        assert!(generator.sink().calls.is_empty());
    }

    // ── Transmit ─────────────────────────────────────────────────────

    #[test]
    fn transmit_click_starts_and_stops_sink() {
        let (mut generator, mut state) = setup();
        move_to(&mut generator, &mut state, Slot::Transmit);

        generator.handle(&mut state, MenuEvent::Click).unwrap();
        assert_eq!(
            generator.sink().calls,
            [Call::Start {
                samples: generator.table().to_vec(),
                reload: 14
            }]
        );

        generator.handle(&mut state, MenuEvent::Click).unwrap();
        assert_eq!(generator.sink().calls.last(), Some(&Call::Stop));
        assert!(!state.is_transmitting());
    }

    #[test]
    fn failed_start_clears_transmit_flag() {
        let (mut generator, mut state) = setup();
        generator.sink_mut().fail_start = true;
        move_to(&mut generator, &mut state, Slot::Transmit);

        let result = generator.handle(&mut state, MenuEvent::Click);
        assert!(matches!(result, Err(OutputError::Sink("dma busy"))));
        assert!(!state.is_transmitting());
    }

    #[test]
    fn failed_stop_keeps_transmit_flag() {
        let (mut generator, mut state) = setup();
        start_output(&mut generator, &mut state);
        generator.sink_mut().fail_stop = true;
        move_to(&mut generator, &mut state, Slot::Transmit);

        let result = generator.handle(&mut state, MenuEvent::Click);
        assert!(matches!(result, Err(OutputError::Sink("dac stuck"))));
        assert!(state.is_transmitting());

        // A second click retries the stop.
        generator.sink_mut().fail_stop = false;
        generator.handle(&mut state, MenuEvent::Click).unwrap();
        assert!(!state.is_transmitting());
        assert_eq!(generator.sink().calls, [Call::Stop]);
    }

    #[test]
    fn failed_restart_clears_transmit_flag() {
        let (mut generator, mut state) = setup();
        start_output(&mut generator, &mut state);
        generator.sink_mut().fail_start = true;

        generator.handle(&mut state, MenuEvent::Click).unwrap();
        let result = generator.handle(&mut state, MenuEvent::Tick(Cw));
        assert!(matches!(result, Err(OutputError::Sink("dma busy"))));
        assert!(!state.is_transmitting());
        assert_eq!(generator.sink().calls, [Call::Stop]);
        assert_eq!(generator.table(), &synthesize(Waveform::Square, Percent::DEFAULT, 100)[..]);

        // Transmit can be started again once the sink recovers.
        generator.sink_mut().fail_start = false;
        generator.handle(&mut state, MenuEvent::Click).unwrap();
        move_to(&mut generator, &mut state, Slot::Transmit);
        generator.handle(&mut state, MenuEvent::Click).unwrap();
        assert!(state.is_transmitting());
        assert_eq!(
            generator.sink().calls.last(),
            Some(&Call::Start {
                samples: generator.table().to_vec(),
                reload: 14
            })
        );
    }

    #[test]
    fn failed_stop_leaves_streaming_table_alone() {
        let (mut generator, mut state) = setup();
        start_output(&mut generator, &mut state);
        generator.sink_mut().fail_stop = true;

        generator.handle(&mut state, MenuEvent::Click).unwrap();
        let result = generator.handle(&mut state, MenuEvent::Tick(Cw));
        assert!(result.is_err());
        assert!(state.is_transmitting());
        assert_eq!(generator.table(), &synthesize(Waveform::Sine, Percent::DEFAULT, 100)[..]);
        assert!(generator.sink().calls.is_empty());
    }

    // ── Reconciliation ───────────────────────────────────────────────

    #[test]
    fn waveform_change_while_idle_does_not_touch_sink() {
        let (mut generator, mut state) = setup();
        drive(&mut generator, &mut state, &[MenuEvent::Click, MenuEvent::Tick(Cw)]);

        assert_eq!(state.waveform(), Waveform::Square);
        assert_eq!(generator.table(), &synthesize(Waveform::Square, Percent::DEFAULT, 100)[..]);
        assert!(generator.sink().calls.is_empty());
    }

    #[test]
    fn waveform_change_while_streaming_restarts_with_new_table() {
        let (mut generator, mut state) = setup();
        start_output(&mut generator, &mut state);

        drive(&mut generator, &mut state, &[MenuEvent::Click, MenuEvent::Tick(Cw)]);

        let expected = synthesize(Waveform::Square, Percent::DEFAULT, 100).to_vec();
        assert_eq!(
            generator.sink().calls,
            [
                Call::Stop,
                Call::Start {
                    samples: expected,
                    reload: 14
                }
            ]
        );
    }

    #[test]
    fn frequency_change_resizes_table_and_timer() {
        let (mut generator, mut state) = setup();
        start_output(&mut generator, &mut state);

        // 100 kHz → 200 kHz: 50 samples per period.
        move_to(&mut generator, &mut state, Slot::Hundreds);
        drive(&mut generator, &mut state, &[MenuEvent::Click, MenuEvent::Tick(Cw)]);
        assert_eq!(state.frequency_hz(), 200_000);

        let plan = generator.rate().apply_frequency(&state).unwrap();
        assert_eq!(plan.sample_count, 50);
        assert_eq!(generator.table().len(), 50);
        assert_eq!(generator.timer_reload(), Some(plan.timer_reload));

        match generator.sink().calls.as_slice() {
            [Call::Stop, Call::Start { samples, reload }] => {
                assert_eq!(samples.len(), 50);
                assert_eq!(*reload, plan.timer_reload);
            }
            other => panic!("unexpected sink calls: {:?}", other),
        }
    }

    #[test]
    fn unit_toggle_retunes_output() {
        let (mut generator, mut state) = setup();
        move_to(&mut generator, &mut state, Slot::Units);
        generator.handle(&mut state, MenuEvent::Click).unwrap();

        assert_eq!(state.unit(), DisplayUnit::Hertz);
        assert_eq!(state.frequency_hz(), 100);
        assert_eq!(generator.table().len(), sample_count_for(100) as usize);
        assert_eq!(generator.timer_reload(), generator.rate().periods().reload_for(100));
    }

    #[test]
    fn percent_change_on_sine_keeps_table() {
        let (mut generator, mut state) = setup();
        start_output(&mut generator, &mut state);

        move_to(&mut generator, &mut state, Slot::Percent);
        drive(&mut generator, &mut state, &[MenuEvent::Click, MenuEvent::Tick(Ccw)]);

        assert_eq!(state.percent().get(), 40);
        assert!(generator.sink().calls.is_empty());
    }

    #[test]
    fn percent_change_on_ramp_rebuilds() {
        let (mut generator, mut state) = setup();
        // Sine → Ramp is one counter-clockwise step.
        drive(
            &mut generator,
            &mut state,
            &[MenuEvent::Click, MenuEvent::Tick(Ccw), MenuEvent::Click],
        );
        assert_eq!(state.waveform(), Waveform::Ramp);

        move_to(&mut generator, &mut state, Slot::Percent);
        drive(&mut generator, &mut state, &[MenuEvent::Click, MenuEvent::Tick(Cw)]);

        assert_eq!(
            generator.table(),
            &synthesize(Waveform::Ramp, Percent::saturating(60), 100)[..]
        );
    }

    #[test]
    fn table_always_matches_plan() {
        let (mut generator, mut state) = setup();
        move_to(&mut generator, &mut state, Slot::Ones);
        generator.handle(&mut state, MenuEvent::Click).unwrap();

        for _ in 0..25 {
            generator.handle(&mut state, MenuEvent::Tick(Ccw)).unwrap();
            let plan = generator.rate().apply_frequency(&state).unwrap();
            assert_eq!(generator.table().len(), plan.sample_count as usize);
            assert_eq!(generator.timer_reload(), Some(plan.timer_reload));
        }
    }
}
