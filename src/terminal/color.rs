//! Color representation shared by cells, fragments, and the parser's current
//! SGR attribute state.

use serde::{Deserialize, Serialize};

/// A drawable color, or the `NONE` sentinel meaning "do not draw this
/// channel" (transparent underline/background, or "use the terminal's
/// default foreground").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Color {
    /// `NONE` per spec §3 — channel is not drawn / inherits the view's default.
    None,
    Rgb(u8, u8, u8),
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color::Rgb(r, g, b)
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::None
    }
}

/// The 16 base/bright ANSI colors (indices 0..15 of the 256-color table) and
/// the named-SGR-code (30-37/90-97) colors, as an immutable struct passed to
/// the terminal at construction rather than a hardcoded global, per spec §9
/// Design Note 6 ("global-ish constants (palette, defaults) -> package as an
/// immutable configuration struct passed to the terminal at construction").
/// Spec §4.5 leaves the 16 base/bright RGB values themselves unspecified;
/// [`Palette::default`] seeds them from `examples/original_source/defaults.h`'s
/// `ANSI_COLORS` / `ANSI_BRIGHT_COLORS` arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub base: [Color; 8],
    pub bright: [Color; 8],
}

impl Default for Palette {
    fn default() -> Self {
        Palette {
            base: [
                Color::rgb(0x1E, 0x1E, 0x1E),
                Color::rgb(0xD7, 0x26, 0x38),
                Color::rgb(0x3E, 0xB0, 0x49),
                Color::rgb(0xF1, 0x9D, 0x1A),
                Color::rgb(0x1A, 0x6F, 0xF1),
                Color::rgb(0xA3, 0x47, 0xBA),
                Color::rgb(0x20, 0xB2, 0xAA),
                Color::rgb(0xC0, 0xC0, 0xC0),
            ],
            bright: [
                Color::rgb(0x4B, 0x4B, 0x4B),
                Color::rgb(0xFF, 0x5C, 0x57),
                Color::rgb(0x5A, 0xF7, 0x8E),
                Color::rgb(0xF3, 0xF9, 0x9D),
                Color::rgb(0x57, 0xC7, 0xFF),
                Color::rgb(0xFF, 0x6A, 0xC1),
                Color::rgb(0x9A, 0xED, 0xFE),
                Color::rgb(0xFF, 0xFF, 0xFF),
            ],
        }
    }
}

/// Converts a 256-color palette index to RGB per spec §4.5:
/// 0..15 from `palette`; 16..231 a 6x6x6 cube; 232..255 a 24-step gray ramp.
/// The cube and gray ramp are fixed formulas, not part of `palette` — spec
/// §4.5 gives them as literal formulas, not a "basic/bright palette" like
/// indices 0..15.
pub fn indexed_to_rgb(index: u8, palette: &Palette) -> Color {
    match index {
        0..=7 => palette.base[index as usize],
        8..=15 => palette.bright[(index - 8) as usize],
        16..=231 => {
            let n = index - 16;
            let r = n / 36;
            let g = (n % 36) / 6;
            let b = n % 6;
            let chan = |v: u8| if v == 0 { 0 } else { v * 40 + 55 };
            Color::rgb(chan(r), chan(g), chan(b))
        }
        232..=255 => {
            let level = ((index as u32 - 232) * 255 / 23) as u8;
            Color::rgb(level, level, level)
        }
    }
}
