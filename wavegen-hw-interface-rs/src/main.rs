//! wavegen-hw-interface
//!
//! Function generator firmware for the Raspberry Pi Pico 2. Wires the
//! library crates into a live loop:
//!
//! 1. The encoder is turned. Every CLK edge wakes the encoder task, which
//!    posts one half-step into the shared `RotationSlot`.
//! 2. The control task wakes every millisecond, takes the pending
//!    half-step count, samples the button, and feeds the debounced ticks and
//!    clicks through `Generator::handle()`.
//! 3. Output changes reach the DAC streaming task through `dac::STREAM`.
//! 4. The OLED task wakes on its 30 Hz timer, snapshots the published
//!    `GeneratorState`, and redraws the panel when it changed.

#![no_std]
#![no_main]

mod dac;

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::block::ImageDef;
use embassy_rp::gpio::{Input, Pull};
use embassy_rp::i2c::{self, I2c};
use embassy_rp::peripherals::{DMA_CH0, I2C0, PIO0};
use embassy_rp::pio::{self, Pio, StateMachine};
use embassy_rp::Peri;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::{Duration, Instant, Ticker};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use wavegen::{
    Direction, Effect, Generator, GeneratorState, InputDebouncer, MenuEvent, RotationSlot,
    TimerClock,
};
use wavegen_oled_display_rs::{panel_update_task, OledDriver, PanelLayout};

use crate::dac::{PioDacSink, DAC_BITS};

// ---------------------------------------------------------------------------
// Boot block and interrupt binding
// ---------------------------------------------------------------------------

/// Tell the RP2350 Boot ROM about our application.
#[link_section = ".start_block"]
#[used]
pub static IMAGE_DEF: ImageDef = embassy_rp::block::ImageDef::secure_exe();

bind_interrupts!(struct Irqs {
    I2C0_IRQ => i2c::InterruptHandler<I2C0>;
    PIO0_IRQ_0 => pio::InterruptHandler<PIO0>;
});

// ---------------------------------------------------------------------------
// Static storage
// ---------------------------------------------------------------------------

/// Pending encoder half-steps, added to by the encoder task and drained by
/// the control task.
static ROTATION: RotationSlot = RotationSlot::new();

/// Last state published by the control task, read by the OLED task.
static PANEL_STATE: StaticCell<Mutex<CriticalSectionRawMutex, GeneratorState>> =
    StaticCell::new();

/// Sample and timer-period tables are too large for a task's locals.
static GENERATOR: StaticCell<Generator<PioDacSink>> = StaticCell::new();

/// Input polling period of the control task.
const CONTROL_PERIOD: Duration = Duration::from_millis(1);

type OledI2c = I2c<'static, I2C0, i2c::Async>;

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// Thin wrapper that monomorphises the generic `panel_update_task` so it
/// can be spawned as a concrete Embassy task.
#[embassy_executor::task]
async fn oled_task(
    driver: OledDriver<OledI2c>,
    state: &'static Mutex<CriticalSectionRawMutex, GeneratorState>,
    layout: PanelLayout,
) {
    panel_update_task(driver, state, layout).await;
}

#[embassy_executor::task]
async fn dac_task(sm: StateMachine<'static, PIO0, 0>, dma: Peri<'static, DMA_CH0>) {
    dac::stream_samples(sm, dma).await;
}

/// Encoder edge source.
///
/// Each CLK edge is one half-step. DT differing from CLK after the edge
/// means clockwise.
#[embassy_executor::task]
async fn encoder_task(mut clk: Input<'static>, dt: Input<'static>) {
    info!("Encoder task started");

    loop {
        clk.wait_for_any_edge().await;

        let direction = if clk.is_high() != dt.is_high() {
            Direction::Clockwise
        } else {
            Direction::CounterClockwise
        };
        ROTATION.post(direction);
    }
}

/// Input polling and generator control loop.
///
/// Owns the `GeneratorState`; the OLED task only ever sees published
/// copies. The mutex is held just long enough to copy the state.
#[embassy_executor::task]
async fn control_task(
    button: Input<'static>,
    generator: &'static mut Generator<PioDacSink>,
    published: &'static Mutex<CriticalSectionRawMutex, GeneratorState>,
) {
    info!("Control task started");

    let mut state = GeneratorState::new();
    let mut input = InputDebouncer::new();
    let mut ticker = Ticker::every(CONTROL_PERIOD);

    if let Err(e) = generator.start_up(&mut state) {
        error!("Generator start-up failed: {}", e);
    }
    *published.lock().await = state;

    loop {
        ticker.next().await;

        let polled = input.poll(ROTATION.take(), button.is_high(), Instant::now().as_millis());
        let events = [polled.tick.map(MenuEvent::Tick), polled.click.then_some(MenuEvent::Click)];

        let mut redraw = false;
        for event in events.into_iter().flatten() {
            match generator.handle(&mut state, event) {
                Ok(effects) => {
                    debug!("{} -> {}", event, state.menu_mode());
                    redraw |= effects.contains(Effect::Redraw);
                }
                Err(e) => {
                    error!("Output error: {}", e);
                    redraw = true;
                }
            }
        }

        if redraw {
            *published.lock().await = state;
        }
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Default::default());
    info!("wavegen-hw-interface starting");

    // —— Pin assignments ————————————————————————————————————————————————————
    // DAC D0..D11 → GP0..GP11
    // ENC_CLK     → GP12  pull-up
    // ENC_DT      → GP13  pull-up
    // ENC_SW      → GP14  active-low, pull-up
    // I2C_SDA     → GP20
    // I2C_SCL     → GP21
    // ———————————————————————————————————————————————————————————————————————

    let i2c = I2c::new_async(
        p.I2C0,
        p.PIN_21, // SCL
        p.PIN_20, // SDA
        Irqs,
        i2c::Config::default(),
    );
    let oled_driver = OledDriver::new(i2c, 0x3C);

    let clk = Input::new(p.PIN_12, Pull::Up);
    let dt = Input::new(p.PIN_13, Pull::Up);
    let button = Input::new(p.PIN_14, Pull::Up);

    // —— PIO DAC ————————————————————————————————————————————————————————————

    let Pio {
        mut common,
        mut sm0,
        ..
    } = Pio::new(p.PIO0, Irqs);

    let dac_pins: [_; DAC_BITS] = [
        common.make_pio_pin(p.PIN_0),
        common.make_pio_pin(p.PIN_1),
        common.make_pio_pin(p.PIN_2),
        common.make_pio_pin(p.PIN_3),
        common.make_pio_pin(p.PIN_4),
        common.make_pio_pin(p.PIN_5),
        common.make_pio_pin(p.PIN_6),
        common.make_pio_pin(p.PIN_7),
        common.make_pio_pin(p.PIN_8),
        common.make_pio_pin(p.PIN_9),
        common.make_pio_pin(p.PIN_10),
        common.make_pio_pin(p.PIN_11),
    ];
    dac::configure(&mut common, &mut sm0, &dac_pins);

    // —— Generator ——————————————————————————————————————————————————————————

    // PIO runs from the 150 MHz system clock, one sample per PIO cycle.
    let clock = TimerClock::default();
    info!("Timer clock: {} Hz, prescaler {}", clock.clock_hz, clock.prescaler);

    let generator = GENERATOR.init_with(|| Generator::new(PioDacSink, clock));
    let published = PANEL_STATE.init(Mutex::new(GeneratorState::new()));

    // —— Spawn tasks ————————————————————————————————————————————————————————

    spawner.spawn(dac_task(sm0, p.DMA_CH0)).unwrap();
    spawner.spawn(oled_task(oled_driver, published, PanelLayout::default())).unwrap();
    spawner.spawn(encoder_task(clk, dt)).unwrap();
    spawner.spawn(control_task(button, generator, published)).unwrap();

    info!("All tasks spawned");
}
