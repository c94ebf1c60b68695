//! Front-panel layout and rendering.
//!
//! This module defines the [`PanelState`] snapshot taken from a
//! [`GeneratorState`], the [`PanelChanges`] diff, and [`render_panel`],
//! which draws one frame using `embedded-graphics`.
//!
//! ```text
//!  0 ┌──────────────────────────┐
//!    │ waveform preview         │    TX: [■]    ← tx_origin / indicator
//!    │ (80 × 40)                │ ▶
//!    │                          │    Duty:      ← caption_origin
//! 45 └──────────────────────────┘  ▲     ▲        ▲ cursor row
//! 50 ──────────────────────────────────────────────── divider
//!     SINE  │  1 0 0  kHz       │  50 %
//!      ^          ^ ^ ^   ^           ^
//!   Waveform  Hundreds/Tens/Ones Units   Percent
//! ```

use core::fmt::Write;

use embedded_graphics::{
    mono_font::{ascii::FONT_6X10, MonoTextStyle, MonoTextStyleBuilder},
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::{Line, Polyline, PrimitiveStyle, Rectangle, Triangle},
    text::{Baseline, Text, TextStyle},
};
use heapless::{String, Vec};
use wavegen::{synthesize, DisplayUnit, GeneratorState, Percent, Slot, Waveform};

/// Most points the waveform preview will plot.
const MAX_PREVIEW_POINTS: usize = 128;

// ── PanelLayout ──────────────────────────────────────────────────────────

/// Geometry and refresh rate of the front panel.
///
/// All coordinates live here. [`PanelLayout::default()`] matches the
/// 128×64 panel of the reference hardware.
#[derive(Debug, Clone)]
pub struct PanelLayout {
    /// Panel refresh rate in Hz. Default: 30.
    pub update_frequency_hz: u32,

    /// Total display width in pixels. Default: 128.
    pub display_width: u32,
    /// Y of the horizontal divider above the field row. Default: 50.
    pub divider_y: i32,
    /// X of the vertical dividers around the frequency field.
    /// Default: `[31, 83]`.
    pub separator_x: [i32; 2],

    /// Top of the field row text. Default: 53.
    pub field_y: i32,
    /// Left edge of the waveform label. Default: 2.
    pub waveform_x: i32,
    /// Left edge of each frequency digit. Default: `[34, 41, 48]`.
    pub digit_x: [i32; 3],
    /// Left edge of the unit label. Default: 60.
    pub unit_x: i32,
    /// Left edge of the percent field. Default: 85.
    pub percent_x: i32,
    /// Top-left of the `Duty:` / `SYM:` caption. Default: (85, 30).
    pub caption_origin: Point,
    /// Top-left of the `TX:` caption. Default: (90, 15).
    pub tx_origin: Point,
    /// Top-left and size of the transmit indicator. Default: (115, 15), 10.
    pub indicator_origin: Point,
    pub indicator_size: u32,

    /// Cursor apex x for slots Waveform..=Percent, in slot order.
    /// Default: `[16, 36, 43, 50, 70, 105]`.
    pub cursor_x: [i32; 6],
    /// Apex y of the upward cursor triangle. Default: 45.
    pub cursor_y: i32,
    /// Height (and half-width) of the cursor triangle. Default: 4.
    pub cursor_size: i32,
    /// Apex of the sideways cursor beside the transmit caption.
    /// Default: (85, 18).
    pub transmit_cursor: Point,

    /// Top-left and size of the waveform preview. Default: (2, 0), 80×40.
    pub preview_origin: Point,
    pub preview_size: Size,
}

impl Default for PanelLayout {
    fn default() -> Self {
        Self {
            update_frequency_hz: 30,
            display_width: 128,
            divider_y: 50,
            separator_x: [31, 83],
            field_y: 53,
            waveform_x: 2,
            digit_x: [34, 41, 48],
            unit_x: 60,
            percent_x: 85,
            caption_origin: Point::new(85, 30),
            tx_origin: Point::new(90, 15),
            indicator_origin: Point::new(115, 15),
            indicator_size: 10,
            cursor_x: [16, 36, 43, 50, 70, 105],
            cursor_y: 45,
            cursor_size: 4,
            transmit_cursor: Point::new(85, 18),
            preview_origin: Point::new(2, 0),
            preview_size: Size::new(80, 40),
        }
    }
}

impl PanelLayout {
    /// Refresh period in milliseconds: `1000 / update_frequency_hz`.
    pub fn update_period_ms(&self) -> u64 {
        1000 / self.update_frequency_hz.max(1) as u64
    }
}

// ── PanelState ───────────────────────────────────────────────────────────

/// Everything the panel shows, copied out of a [`GeneratorState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelState {
    pub waveform: Waveform,
    /// Frequency digits, most significant first; `None` is blanked.
    pub digits: [Option<u8>; 3],
    pub unit: DisplayUnit,
    /// Duty or symmetry; `None` for waveforms that ignore it.
    pub percent: Option<u8>,
    pub transmitting: bool,
    pub cursor: Slot,
    /// `true` while the slot under the cursor is being edited.
    pub editing: bool,
}

impl PanelState {
    pub fn from_generator(state: &GeneratorState) -> Self {
        let waveform = state.waveform();
        Self {
            waveform,
            digits: state.frequency_digits(),
            unit: state.unit(),
            percent: waveform.uses_percent().then(|| state.percent().get()),
            transmitting: state.is_transmitting(),
            cursor: state.cursor(),
            editing: state.menu_mode().is_editing(),
        }
    }

    fn is_edited(&self, slot: Slot) -> bool {
        self.editing && self.cursor == slot
    }
}

// ── PanelChanges ─────────────────────────────────────────────────────────

/// Which regions differ between two [`PanelState`] snapshots.
pub struct PanelChanges {
    /// Waveform or percent changed, so the preview must be redrawn.
    pub preview_changed: bool,
    /// Any text field in the bottom row or the transmit caption changed.
    pub fields_changed: bool,
    /// Cursor moved or switched between select and edit.
    pub cursor_changed: bool,
}

impl PanelChanges {
    pub fn detect(old: &PanelState, new: &PanelState) -> Self {
        Self {
            preview_changed: old.waveform != new.waveform || old.percent != new.percent,
            fields_changed: old.waveform != new.waveform
                || old.digits != new.digits
                || old.unit != new.unit
                || old.percent != new.percent
                || old.transmitting != new.transmitting,
            cursor_changed: old.cursor != new.cursor || old.editing != new.editing,
        }
    }

    pub fn any_changed(&self) -> bool {
        self.preview_changed || self.fields_changed || self.cursor_changed
    }
}

// ── Rendering ────────────────────────────────────────────────────────────

fn field_style(inverted: bool) -> MonoTextStyle<'static, BinaryColor> {
    let builder = MonoTextStyleBuilder::new().font(&FONT_6X10);
    if inverted {
        builder
            .text_color(BinaryColor::Off)
            .background_color(BinaryColor::On)
            .build()
    } else {
        builder.text_color(BinaryColor::On).build()
    }
}

fn draw_text<D>(display: &mut D, text: &str, origin: Point, inverted: bool) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    Text::with_text_style(
        text,
        origin,
        field_style(inverted),
        TextStyle::with_baseline(Baseline::Top),
    )
    .draw(display)?;
    Ok(())
}

/// Render `panel` using `embedded-graphics`.
///
/// The caller clears the buffer first. The field being edited is drawn
/// inverted and its cursor triangle filled.
///
/// # Example
///
/// ```no_run
/// # use wavegen::GeneratorState;
/// # use wavegen_oled_display_rs::layout::{render_panel, PanelLayout, PanelState};
/// # fn example(display: &mut impl embedded_graphics::draw_target::DrawTarget<Color = embedded_graphics::pixelcolor::BinaryColor>) {
/// let panel = PanelState::from_generator(&GeneratorState::new());
/// render_panel(display, &panel, &PanelLayout::default()).ok();
/// # }
/// ```
pub fn render_panel<D>(display: &mut D, panel: &PanelState, layout: &PanelLayout) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    draw_frame(display, layout)?;
    draw_preview(display, panel, layout)?;
    draw_fields(display, panel, layout)?;
    draw_transmit(display, panel, layout)?;
    draw_cursor(display, panel, layout)
}

fn draw_frame<D>(display: &mut D, layout: &PanelLayout) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let stroke = PrimitiveStyle::with_stroke(BinaryColor::On, 1);
    let right = layout.display_width as i32 - 1;
    let bottom = display.bounding_box().size.height as i32 - 1;

    Line::new(Point::new(0, layout.divider_y), Point::new(right, layout.divider_y))
        .into_styled(stroke)
        .draw(display)?;
    for x in layout.separator_x {
        Line::new(Point::new(x, layout.divider_y + 1), Point::new(x, bottom))
            .into_styled(stroke)
            .draw(display)?;
    }
    Ok(())
}

/// One period of the current waveform, scaled into the preview box.
fn draw_preview<D>(display: &mut D, panel: &PanelState, layout: &PanelLayout) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let width = (layout.preview_size.width as usize).min(MAX_PREVIEW_POINTS);
    let height = layout.preview_size.height as i32;
    if width < 2 || height < 2 {
        return Ok(());
    }

    let percent = Percent::saturating(panel.percent.unwrap_or(Percent::DEFAULT.get()));
    let samples = synthesize(panel.waveform, percent, width);

    let top = layout.preview_origin.y;
    let span = height - 1;
    let points: Vec<Point, MAX_PREVIEW_POINTS> = samples
        .iter()
        .enumerate()
        .map(|(i, &code)| {
            let y = top + span - code as i32 * span / wavegen::config::DAC_MAX_CODE as i32;
            Point::new(layout.preview_origin.x + i as i32, y)
        })
        .collect();

    Polyline::new(&points)
        .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
        .draw(display)
}

fn draw_fields<D>(display: &mut D, panel: &PanelState, layout: &PanelLayout) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let y = layout.field_y;

    draw_text(
        display,
        panel.waveform.label(),
        Point::new(layout.waveform_x, y),
        panel.is_edited(Slot::Waveform),
    )?;

    let digit_slots = [Slot::Hundreds, Slot::Tens, Slot::Ones];
    for ((digit, x), slot) in panel.digits.iter().zip(layout.digit_x).zip(digit_slots) {
        if let Some(d) = digit {
            let mut buf: String<4> = String::new();
            let _ = write!(buf, "{}", d);
            draw_text(display, &buf, Point::new(x, y), panel.is_edited(slot))?;
        }
    }

    draw_text(display, panel.unit.label(), Point::new(layout.unit_x, y), false)?;

    if let Some(p) = panel.percent {
        let mut buf: String<8> = String::new();
        let _ = write!(buf, "{} %", p);
        draw_text(
            display,
            &buf,
            Point::new(layout.percent_x, y),
            panel.is_edited(Slot::Percent),
        )?;

        let caption = match panel.waveform {
            Waveform::Square => "Duty:",
            _ => "SYM:",
        };
        draw_text(display, caption, layout.caption_origin, false)?;
    }
    Ok(())
}

fn draw_transmit<D>(display: &mut D, panel: &PanelState, layout: &PanelLayout) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let caption = if panel.transmitting { "TX!" } else { "TX:" };
    draw_text(display, caption, layout.tx_origin, false)?;

    let style = if panel.transmitting {
        PrimitiveStyle::with_fill(BinaryColor::On)
    } else {
        PrimitiveStyle::with_stroke(BinaryColor::On, 1)
    };
    Rectangle::new(
        layout.indicator_origin,
        Size::new_equal(layout.indicator_size),
    )
    .into_styled(style)
    .draw(display)
}

fn draw_cursor<D>(display: &mut D, panel: &PanelState, layout: &PanelLayout) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let s = layout.cursor_size;
    let triangle = match panel.cursor {
        Slot::Transmit => {
            let apex = layout.transmit_cursor;
            Triangle::new(apex, apex + Point::new(-s + 1, -s + 1), apex + Point::new(-s + 1, s - 1))
        }
        slot => {
            let apex = Point::new(layout.cursor_x[slot.index()], layout.cursor_y);
            Triangle::new(apex, apex + Point::new(-s + 1, s), apex + Point::new(s - 1, s))
        }
    };

    let style = if panel.editing {
        PrimitiveStyle::with_fill(BinaryColor::On)
    } else {
        PrimitiveStyle::with_stroke(BinaryColor::On, 1)
    };
    triangle.into_styled(style).draw(display)
}

// ── Tests ────────────────────────────────────────────────────────────────
