//! Periodic front-panel refresh.
//!
//! [`panel_update_task`] snapshots the shared [`GeneratorState`] at the
//! configured rate and pushes a new frame to the panel whenever the
//! snapshot differs from the last one drawn.

use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, mutex::Mutex};
use embedded_hal_async::i2c::I2c;
use wavegen::GeneratorState;

use crate::driver::OledDriver;
use crate::layout::{PanelChanges, PanelLayout, PanelState};

// ── Panel update task ────────────────────────────────────────────────────

/// Panel refresh loop.
///
/// This is a regular `async fn`, **not** an Embassy `#[task]`. Embassy
/// tasks cannot be generic, so callers wrap it in a concrete task:
///
/// ```ignore
/// #[embassy_executor::task]
/// async fn oled_task(
///     driver: OledDriver<MyConcreteI2cType>,
///     state: &'static Mutex<CriticalSectionRawMutex, GeneratorState>,
///     layout: PanelLayout,
/// ) {
///     panel_update_task(driver, state, layout).await;
/// }
/// ```
///
/// # Control flow
///
/// 1. Initialise the display hardware.
/// 2. Loop at `layout.update_frequency_hz`:
///    - Lock `state` and copy out a [`PanelState`]. Release the mutex.
///    - Skip if nothing changed since the last drawn frame.
///    - Render into the frame buffer and flush (~20 ms I2C, no mutex held).
///
/// # Errors
///
/// * Initialisation failure: logs the error and **returns** (task exits).
/// * Render / flush failure: logs the error and retries next cycle.
#[allow(clippy::needless_pass_by_value)] // layout is consumed for the task lifetime
pub async fn panel_update_task<I2C>(
    mut driver: OledDriver<I2C>,
    state: &'static Mutex<CriticalSectionRawMutex, GeneratorState>,
    layout: PanelLayout,
) where
    I2C: I2c,
{
    if let Err(_e) = driver.init().await {
        #[cfg(feature = "defmt")]
        defmt::error!("OLED init failed: {}", _e);
        return;
    }

    #[cfg(feature = "defmt")]
    defmt::info!("OLED initialised");

    let period = embassy_time::Duration::from_millis(layout.update_period_ms());
    let mut last_drawn: Option<PanelState> = None;

    loop {
        let panel = {
            let state = state.lock().await;
            PanelState::from_generator(&state)
        };

        let stale = match &last_drawn {
            Some(last) => PanelChanges::detect(last, &panel).any_changed(),
            None => true,
        };

        if stale {
            match redraw(&mut driver, &panel, &layout).await {
                Ok(()) => last_drawn = Some(panel),
                Err(_e) => {
                    #[cfg(feature = "defmt")]
                    defmt::error!("Panel refresh failed: {}", _e);
                }
            }
        }

        embassy_time::Timer::after(period).await;
    }
}

async fn redraw<I2C: I2c>(
    driver: &mut OledDriver<I2C>,
    panel: &PanelState,
    layout: &PanelLayout,
) -> Result<(), crate::OledError> {
    driver.draw(panel, layout)?;
    driver.flush().await
}
