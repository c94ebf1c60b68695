//! Front panel of the wavegen function generator on an SSD1306 (128×64).
//!
//! This crate provides [`OledDriver`], a wrapper around the [`ssd1306`]
//! crate in async buffered-graphics mode, the [`PanelState`] snapshot and
//! [`render_panel`] drawing code, and [`panel_update_task`], a periodic
//! loop that redraws the panel from a shared [`GeneratorState`].
//!
//! # Quick Start
//!
//! ```ignore
//! use wavegen_oled_display_rs::{OledDriver, PanelLayout, panel_update_task};
//!
//! // In your Embassy main:
//! let oled = OledDriver::new(i2c_oled, 0x3C);
//! spawner.spawn(oled_task(oled, &GENERATOR_STATE, PanelLayout::default())).unwrap();
//!
//! // Thin task wrapper (Embassy tasks cannot be generic):
//! #[embassy_executor::task]
//! async fn oled_task(
//!     driver: OledDriver<MyI2cType>,
//!     state: &'static Mutex<CriticalSectionRawMutex, GeneratorState>,
//!     layout: PanelLayout,
//! ) {
//!     panel_update_task(driver, state, layout).await;
//! }
//! ```
//!
//! # Crate Features
//!
//! - **`defmt`**: structured logging via [`defmt`].
//! - **`task`**: the Embassy [`panel_update_task`].
//!
//! [`GeneratorState`]: wavegen::GeneratorState

#![no_std]

#[cfg(feature = "task")]
pub mod display_task;
pub mod driver;
pub mod error;
pub mod layout;

// ── Re-exports for convenience ───────────────────────────────────────────

#[cfg(feature = "task")]
pub use display_task::panel_update_task;
pub use driver::OledDriver;
pub use error::OledError;
pub use layout::{render_panel, PanelChanges, PanelLayout, PanelState};
