use ratatui::style::Color;

/// Runtime theme with configurable colors
#[derive(Debug, Clone)]
pub struct Theme {
    // Background colors
    pub bg0: Color,
    pub bg1: Color,
    pub bg2: Color,

    // Foreground colors
    pub fg0: Color,
    pub fg1: Color,
    pub grey0: Color,
    pub grey1: Color,

    // Palette colors
    pub red: Color,
    pub orange: Color,
    pub yellow: Color,
    pub green: Color,
    pub aqua: Color,
    pub blue: Color,

    // Semantic colors
    pub selection: Color,
    pub error: Color,
    pub success: Color,
    pub warning: Color,
    pub accent: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::gruvbox_dark()
    }
}

impl Theme {
    pub fn gruvbox_dark() -> Self {
        Self {
            bg0: Color::Rgb(0x28, 0x28, 0x28),
            bg1: Color::Rgb(0x32, 0x30, 0x2f),
            bg2: Color::Rgb(0x45, 0x40, 0x3d),
            fg0: Color::Rgb(0xd4, 0xbe, 0x98),
            fg1: Color::Rgb(0xdd, 0xc7, 0xa1),
            grey0: Color::Rgb(0x7c, 0x6f, 0x64),
            grey1: Color::Rgb(0x92, 0x83, 0x74),
            red: Color::Rgb(0xea, 0x69, 0x62),
            orange: Color::Rgb(0xe7, 0x8a, 0x4e),
            yellow: Color::Rgb(0xd8, 0xa6, 0x57),
            green: Color::Rgb(0xa9, 0xb6, 0x65),
            aqua: Color::Rgb(0x89, 0xb4, 0x82),
            blue: Color::Rgb(0x7d, 0xae, 0xa3),
            selection: Color::Rgb(0x45, 0x40, 0x3d),
            error: Color::Rgb(0xea, 0x69, 0x62),
            success: Color::Rgb(0xa9, 0xb6, 0x65),
            warning: Color::Rgb(0xe7, 0x8a, 0x4e),
            accent: Color::Rgb(0x89, 0xb4, 0x82),
        }
    }

    pub fn gruvbox_light() -> Self {
        Self {
            bg0: Color::Rgb(0xfb, 0xf1, 0xc7),
            bg1: Color::Rgb(0xf2, 0xe5, 0xbc),
            bg2: Color::Rgb(0xeb, 0xdb, 0xb2),
            fg0: Color::Rgb(0x65, 0x47, 0x35),
            fg1: Color::Rgb(0x4f, 0x38, 0x29),
            grey0: Color::Rgb(0xa8, 0x99, 0x84),
            grey1: Color::Rgb(0x92, 0x83, 0x74),
            red: Color::Rgb(0xc1, 0x4a, 0x4a),
            orange: Color::Rgb(0xc3, 0x5e, 0x0a),
            yellow: Color::Rgb(0xb4, 0x71, 0x09),
            green: Color::Rgb(0x6c, 0x78, 0x2e),
            aqua: Color::Rgb(0x4c, 0x7a, 0x5d),
            blue: Color::Rgb(0x45, 0x70, 0x7a),
            selection: Color::Rgb(0xeb, 0xdb, 0xb2),
            error: Color::Rgb(0xc1, 0x4a, 0x4a),
            success: Color::Rgb(0x6c, 0x78, 0x2e),
            warning: Color::Rgb(0xc3, 0x5e, 0x0a),
            accent: Color::Rgb(0x4c, 0x7a, 0x5d),
        }
    }

    /// Look up a built-in theme; unknown names fall back to gruvbox-dark
    pub fn by_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "gruvbox-light" => Self::gruvbox_light(),
            "gruvbox-dark" => Self::gruvbox_dark(),
            other => {
                tracing::warn!("Unknown theme '{}', using gruvbox-dark", other);
                Self::gruvbox_dark()
            }
        }
    }

    /// Blend `color` toward the background; opacity 0.0 is invisible
    pub fn fade(&self, color: Color, opacity: f64) -> Color {
        let opacity = opacity.clamp(0.0, 1.0);
        match (color, self.bg0) {
            (Color::Rgb(r, g, b), Color::Rgb(br, bg, bb)) => Color::Rgb(
                mix(br, r, opacity),
                mix(bg, g, opacity),
                mix(bb, b, opacity),
            ),
            // Named colors cannot be blended
            _ if opacity < 0.5 => self.bg0,
            _ => color,
        }
    }
}

fn mix(from: u8, to: u8, t: f64) -> u8 {
    (from as f64 + (to as f64 - from as f64) * t).round() as u8
}
