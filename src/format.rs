//! Text formatting for bars and memory sizes.

use std::fmt;

pub const FILLED_GLYPH: char = '#';
pub const EMPTY_GLYPH: char = ' ';

const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

/// A usage bar of `bar_length` cells with `filled_width` of them filled.
///
/// `filled_width` is not clamped: a fraction above 1.0 produces a bar longer
/// than `bar_length` with no empty cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageBar {
    pub filled_width: usize,
    pub bar_length: usize,
}

impl UsageBar {
    pub fn from_fraction(fraction: f64, bar_length: usize) -> Self {
        // `as` saturates: NaN and negatives become 0.
        let filled_width = (fraction * bar_length as f64).floor() as usize;
        Self {
            filled_width,
            bar_length,
        }
    }

    pub fn empty_width(&self) -> usize {
        self.bar_length.saturating_sub(self.filled_width)
    }
}

impl fmt::Display for UsageBar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut bar = String::with_capacity(self.filled_width + self.empty_width());
        bar.extend(std::iter::repeat(FILLED_GLYPH).take(self.filled_width));
        bar.extend(std::iter::repeat(EMPTY_GLYPH).take(self.empty_width()));
        f.write_str(&bar)
    }
}

/// Renders a KiB count either raw (`"512 KiB"`) or scaled to the largest
/// unit below 1024 (`"1.00 MiB"`).
pub fn kib_to_display_string(kib: u64, human_readable: bool) -> String {
    if !human_readable {
        return format!("{} KiB", kib);
    }

    let mut value = kib as f64 * 1024.0;
    for unit in &UNITS[..UNITS.len() - 1] {
        if value < 1024.0 {
            return format!("{:.2} {}", value, unit);
        }
        value /= 1024.0;
    }
    format!("{:.2} {}", value, UNITS[UNITS.len() - 1])
}

/// Percentage with no decimals (ties round to even).
pub fn format_percent(fraction: f64) -> String {
    format!("{:.0}", fraction * 100.0)
}
