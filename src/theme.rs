use iced::{Color, Theme};

// ─── THEME MODE ─────────────────────────────────────────────────

/// The single boolean theme flag of the dashboard. Starts dark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeMode {
    #[default]
    Dark,
    Light,
}

impl ThemeMode {
    pub fn toggled(self) -> Self {
        match self {
            ThemeMode::Dark => ThemeMode::Light,
            ThemeMode::Light => ThemeMode::Dark,
        }
    }

    pub fn is_dark(self) -> bool {
        self == ThemeMode::Dark
    }

    /// Global iced theme matching the palette.
    pub fn iced_theme(self) -> Theme {
        match self {
            ThemeMode::Dark => Theme::Dark,
            ThemeMode::Light => Theme::Light,
        }
    }

    pub fn palette(self) -> Palette {
        match self {
            ThemeMode::Dark => DARK,
            ThemeMode::Light => LIGHT,
        }
    }
}

// ─── PALETTE ────────────────────────────────────────────────────

/// Semantic colors used by every panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub bg_main: Color,
    pub bg_secondary: Color,
    pub surface: Color,
    pub surface_hover: Color,
    pub border_subtle: Color,
    pub grid: Color,
    pub text_main: Color,
    pub text_secondary: Color,
    pub text_muted: Color,
    // Semantic
    pub primary: Color,
    pub secondary: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
}

const DARK: Palette = Palette {
    bg_main:        hex(0x0f, 0x11, 0x17),
    bg_secondary:   hex(0x16, 0x19, 0x22),
    surface:        hex(0x1c, 0x20, 0x2b),
    surface_hover:  hex(0x25, 0x2a, 0x37),
    border_subtle:  hex(0x2c, 0x31, 0x3f),
    grid:           Color::from_rgba(1.0, 1.0, 1.0, 0.06),
    text_main:      hex(0xe6, 0xe9, 0xf0),
    text_secondary: hex(0xa3, 0xab, 0xbd),
    text_muted:     hex(0x6b, 0x73, 0x86),
    primary:        hex(0x3b, 0x82, 0xf6),
    secondary:      hex(0x8b, 0x5c, 0xf6),
    success:        hex(0x22, 0xc5, 0x5e),
    warning:        hex(0xf5, 0x9e, 0x0b),
    error:          hex(0xef, 0x44, 0x44),
};

const LIGHT: Palette = Palette {
    bg_main:        hex(0xf5, 0xf6, 0xf8),
    bg_secondary:   hex(0xeb, 0xed, 0xf1),
    surface:        hex(0xff, 0xff, 0xff),
    surface_hover:  hex(0xf0, 0xf2, 0xf5),
    border_subtle:  hex(0xdd, 0xe1, 0xe7),
    grid:           Color::from_rgba(0.0, 0.0, 0.0, 0.06),
    text_main:      hex(0x1a, 0x1d, 0x24),
    text_secondary: hex(0x4b, 0x52, 0x61),
    text_muted:     hex(0x8a, 0x91, 0x9e),
    primary:        hex(0x25, 0x63, 0xeb),
    secondary:      hex(0x7c, 0x3a, 0xed),
    success:        hex(0x16, 0xa3, 0x4a),
    warning:        hex(0xd9, 0x77, 0x06),
    error:          hex(0xdc, 0x26, 0x26),
};

/// Same color with alpha replaced.
pub fn with_alpha(c: Color, a: f32) -> Color {
    Color { a, ..c }
}

const fn hex(r: u8, g: u8, b: u8) -> Color {
    Color::from_rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
}
