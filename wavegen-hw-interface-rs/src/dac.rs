//! 12-bit parallel DAC driven by PIO0 state machine 0.
//!
//! The state machine runs a single `out pins, 12` instruction with
//! autopull, so it emits one sample per PIO clock. Its clock divider is
//! therefore the number of system clock cycles per sample, which is
//! exactly `timer_reload + 1` for a [`TimerClock`](wavegen::TimerClock)
//! built from the system clock with no prescaler.
//!
//! [`PioDacSink`] is the control loop's [`OutputSink`]. It never touches
//! the PIO itself: it posts a [`StreamCommand`] that [`stream_samples`]
//! picks up and turns into back-to-back DMA transfers of the table.

use embassy_futures::select::{select, Either};
use embassy_rp::peripherals::{DMA_CH0, PIO0};
use embassy_rp::pio::{
    Common, Config, Direction as PinDirection, FifoJoin, Pin, ShiftConfig, ShiftDirection,
    StateMachine,
};
use embassy_rp::Peri;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use fixed::traits::ToFixed;
use wavegen::{OutputSink, SampleTable};

/// Data lines of the DAC, least significant bit first.
pub const DAC_BITS: usize = 12;

/// Latest request for the streaming task. Newer commands replace unread
/// ones.
pub static STREAM: Signal<CriticalSectionRawMutex, StreamCommand> = Signal::new();

pub enum StreamCommand {
    Start {
        samples: SampleTable,
        clock_divider: u32,
    },
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum SinkError {
    /// Asked to stream a table with no samples.
    EmptyTable,
    /// Timer period does not fit the PIO clock divider.
    DividerOutOfRange(u32),
}

/// Largest integer part of the PIO clock divider.
const MAX_CLOCK_DIVIDER: u32 = 65_535;

pub struct PioDacSink;

impl OutputSink for PioDacSink {
    type Error = SinkError;

    fn start(&mut self, samples: &[u16], timer_reload: u32) -> Result<(), SinkError> {
        if samples.is_empty() {
            return Err(SinkError::EmptyTable);
        }
        let clock_divider = timer_reload.saturating_add(1);
        if clock_divider > MAX_CLOCK_DIVIDER {
            return Err(SinkError::DividerOutOfRange(clock_divider));
        }

        let mut table = SampleTable::new();
        // Same capacity on both sides.
        let _ = table.extend_from_slice(samples);
        STREAM.signal(StreamCommand::Start {
            samples: table,
            clock_divider,
        });
        Ok(())
    }

    fn stop(&mut self) -> Result<(), SinkError> {
        STREAM.signal(StreamCommand::Stop);
        Ok(())
    }
}

/// Load the DAC program and configure `sm` to drive `pins`.
///
/// The state machine is left disabled until the first start command.
pub fn configure(
    common: &mut Common<'static, PIO0>,
    sm: &mut StateMachine<'static, PIO0, 0>,
    pins: &[Pin<'static, PIO0>; DAC_BITS],
) {
    let program = pio::pio_asm!(
        ".wrap_target",
        "out pins, 12",
        ".wrap",
    );

    let pin_refs: [&Pin<'static, PIO0>; DAC_BITS] = core::array::from_fn(|i| &pins[i]);

    let mut cfg = Config::default();
    cfg.use_program(&common.load_program(&program.program), &[]);
    cfg.set_out_pins(&pin_refs);
    cfg.shift_out = ShiftConfig {
        auto_fill: true,
        threshold: DAC_BITS as u8,
        direction: ShiftDirection::Right,
    };
    cfg.fifo_join = FifoJoin::TxOnly;
    cfg.clock_divider = 1u8.to_fixed();

    sm.set_config(&cfg);
    sm.set_pin_dirs(PinDirection::Out, &pin_refs);
    sm.set_enable(false);
}

/// Stream the most recent table until told otherwise.
///
/// Each pass over the table is one DMA transfer. A new command aborts the
/// transfer in flight, and a restart begins at the first sample of the
/// new table.
pub async fn stream_samples(mut sm: StateMachine<'static, PIO0, 0>, mut dma: Peri<'static, DMA_CH0>) {
    let mut command = STREAM.wait().await;

    loop {
        match command {
            StreamCommand::Stop => {
                sm.set_enable(false);
                defmt::info!("DAC stream stopped");
                command = STREAM.wait().await;
            }
            StreamCommand::Start {
                samples,
                clock_divider,
            } => {
                sm.set_enable(false);
                sm.clear_fifos();
                sm.set_clock_divider(clock_divider.to_fixed());
                sm.clkdiv_restart();
                sm.set_enable(true);
                defmt::info!(
                    "DAC stream: {} samples, divider {}",
                    samples.len(),
                    clock_divider
                );

                command = loop {
                    let transfer = sm.tx().dma_push(dma.reborrow(), &samples, false);
                    if let Either::Second(next) = select(transfer, STREAM.wait()).await {
                        break next;
                    }
                };
            }
        }
    }
}
