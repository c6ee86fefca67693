//! Style value types and value-token parsing.
//!
//! Everything a declaration value can resolve to: colors, lengths, font
//! descriptors, text decoration flags. Lengths stay in their source unit
//! until the cascade resolves them against a font-size context.

/// A box side, for per-side border and padding lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Top, Side::Right, Side::Bottom, Side::Left];

    /// Index into `[top, right, bottom, left]` arrays.
    pub fn index(self) -> usize {
        match self {
            Side::Top => 0,
            Side::Right => 1,
            Side::Bottom => 2,
            Side::Left => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Side::Top => "top",
            Side::Right => "right",
            Side::Bottom => "bottom",
            Side::Left => "left",
        }
    }
}

/// A resolved color value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Color {
    pub const TRANSPARENT: Color = Color {
        r: 0,
        g: 0,
        b: 0,
        a: 0.0,
    };
    pub const BLACK: Color = Color {
        r: 0,
        g: 0,
        b: 0,
        a: 1.0,
    };
    pub const WHITE: Color = Color {
        r: 255,
        g: 255,
        b: 255,
        a: 1.0,
    };

    pub fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Convert to [f32; 4] with components in 0..1 for rendering.
    pub fn to_f32_array(&self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a,
        ]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

/// A length value in its source unit.
///
/// `to_px` resolves against a font-size context; percentages carry no
/// meaning outside of `font-size` and are rejected there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Length {
    /// Pixels.
    Px(f32),
    /// Points (1pt = 4/3 px at 96 dpi).
    Pt(f32),
    /// Em (relative to the element's font size).
    Em(f32),
    /// Percentage. Only meaningful for font-size.
    Percent(f32),
}

impl Length {
    /// Resolve to absolute pixels against `em_base` (the element's font
    /// size in pixels). Percentages have no size context here and return
    /// `None`.
    pub fn to_px(&self, em_base: f32) -> Option<f32> {
        match self {
            Length::Px(px) => Some(*px),
            Length::Pt(pt) => Some(pt * 96.0 / 72.0),
            Length::Em(em) => Some(em * em_base),
            Length::Percent(_) => None,
        }
    }
}

/// Font weight, CSS numeric scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontWeight(pub u16);

impl FontWeight {
    pub const NORMAL: FontWeight = FontWeight(400);
    pub const BOLD: FontWeight = FontWeight(700);
}

impl Default for FontWeight {
    fn default() -> Self {
        Self::NORMAL
    }
}

/// Font style values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
    Oblique,
}

/// A fully materialized font: the composition of the independently
/// cascading font-family/size/weight/style sub-properties.
#[derive(Debug, Clone, PartialEq)]
pub struct FontDescription {
    /// Comma-separated family list, first match wins downstream.
    pub family: String,
    /// Size in pixels, already resolved.
    pub size_px: f32,
    pub weight: FontWeight,
    pub style: FontStyle,
}

impl Default for FontDescription {
    fn default() -> Self {
        Self {
            family: "sans-serif".to_string(),
            size_px: 16.0,
            weight: FontWeight::NORMAL,
            style: FontStyle::Normal,
        }
    }
}

/// Text decoration flag set.
///
/// These are the CSS values; blink is recognized but never rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextDecoration {
    pub underline: bool,
    pub overline: bool,
    pub line_through: bool,
}

impl TextDecoration {
    pub const NONE: TextDecoration = TextDecoration {
        underline: false,
        overline: false,
        line_through: false,
    };

    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }
}

/// Parse a color value token: named colors, `#hex`, `rgb()`, `rgba()`.
pub fn parse_color(value: &str) -> Option<Color> {
    let value = value.trim();

    match value.to_ascii_lowercase().as_str() {
        "transparent" => return Some(Color::TRANSPARENT),
        "black" => return Some(Color::BLACK),
        "white" => return Some(Color::WHITE),
        "red" => return Some(Color::from_rgb(255, 0, 0)),
        "green" => return Some(Color::from_rgb(0, 128, 0)),
        "blue" => return Some(Color::from_rgb(0, 0, 255)),
        "yellow" => return Some(Color::from_rgb(255, 255, 0)),
        "orange" => return Some(Color::from_rgb(255, 165, 0)),
        "purple" => return Some(Color::from_rgb(128, 0, 128)),
        "pink" => return Some(Color::from_rgb(255, 192, 203)),
        "brown" => return Some(Color::from_rgb(165, 42, 42)),
        "gray" | "grey" => return Some(Color::from_rgb(128, 128, 128)),
        "lightgray" | "lightgrey" => return Some(Color::from_rgb(211, 211, 211)),
        "darkgray" | "darkgrey" => return Some(Color::from_rgb(169, 169, 169)),
        "silver" => return Some(Color::from_rgb(192, 192, 192)),
        "cyan" | "aqua" => return Some(Color::from_rgb(0, 255, 255)),
        "magenta" | "fuchsia" => return Some(Color::from_rgb(255, 0, 255)),
        "lime" => return Some(Color::from_rgb(0, 255, 0)),
        "navy" => return Some(Color::from_rgb(0, 0, 128)),
        "teal" => return Some(Color::from_rgb(0, 128, 128)),
        "olive" => return Some(Color::from_rgb(128, 128, 0)),
        "maroon" => return Some(Color::from_rgb(128, 0, 0)),
        "gold" => return Some(Color::from_rgb(255, 215, 0)),
        "ivory" => return Some(Color::from_rgb(255, 255, 240)),
        "beige" => return Some(Color::from_rgb(245, 245, 220)),
        "khaki" => return Some(Color::from_rgb(240, 230, 140)),
        "salmon" => return Some(Color::from_rgb(250, 128, 114)),
        "crimson" => return Some(Color::from_rgb(220, 20, 60)),
        "steelblue" => return Some(Color::from_rgb(70, 130, 180)),
        "skyblue" => return Some(Color::from_rgb(135, 206, 235)),
        "whitesmoke" => return Some(Color::from_rgb(245, 245, 245)),
        "gainsboro" => return Some(Color::from_rgb(220, 220, 220)),
        "dimgray" | "dimgrey" => return Some(Color::from_rgb(105, 105, 105)),
        _ => {}
    }

    if let Some(hex) = value.strip_prefix('#') {
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let (r, g, b, a) = match hex.len() {
            3 => {
                let r = u8::from_str_radix(&hex[0..1], 16).ok()? * 17;
                let g = u8::from_str_radix(&hex[1..2], 16).ok()? * 17;
                let b = u8::from_str_radix(&hex[2..3], 16).ok()? * 17;
                (r, g, b, 1.0)
            }
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                (r, g, b, 1.0)
            }
            8 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                let a = u8::from_str_radix(&hex[6..8], 16).ok()? as f32 / 255.0;
                (r, g, b, a)
            }
            _ => return None,
        };
        return Some(Color::new(r, g, b, a));
    }

    if value.starts_with("rgb(") || value.starts_with("rgba(") {
        let inner = value
            .trim_start_matches("rgba(")
            .trim_start_matches("rgb(")
            .trim_end_matches(')');
        let parts: Vec<&str> = inner.split(',').collect();
        if parts.len() == 3 || parts.len() == 4 {
            let r = parts[0].trim().parse::<u8>().ok()?;
            let g = parts[1].trim().parse::<u8>().ok()?;
            let b = parts[2].trim().parse::<u8>().ok()?;
            let a = if parts.len() == 4 {
                let a = parts[3].trim().parse::<f32>().ok()?;
                if !(0.0..=1.0).contains(&a) {
                    return None;
                }
                a
            } else {
                1.0
            };
            return Some(Color::new(r, g, b, a));
        }
    }

    None
}

/// Parse a length value token. A bare number is taken as pixels.
pub fn parse_length(value: &str) -> Option<Length> {
    let value = value.trim();

    if let Some(num) = value.strip_suffix("px") {
        return num.trim().parse::<f32>().ok().map(Length::Px);
    }
    if let Some(num) = value.strip_suffix("pt") {
        return num.trim().parse::<f32>().ok().map(Length::Pt);
    }
    if let Some(num) = value.strip_suffix("em") {
        return num.trim().parse::<f32>().ok().map(Length::Em);
    }
    if let Some(num) = value.strip_suffix('%') {
        return num.trim().parse::<f32>().ok().map(Length::Percent);
    }
    value.parse::<f32>().ok().map(Length::Px)
}

/// Parse a font-weight token: `normal`, `bold`, or 100..900.
pub fn parse_font_weight(value: &str) -> Option<FontWeight> {
    match value.trim() {
        "normal" => Some(FontWeight::NORMAL),
        "bold" => Some(FontWeight::BOLD),
        num => {
            let n = num.parse::<u16>().ok()?;
            if (100..=900).contains(&n) && n % 100 == 0 {
                Some(FontWeight(n))
            } else {
                None
            }
        }
    }
}

/// Parse a font-style token.
pub fn parse_font_style(value: &str) -> Option<FontStyle> {
    match value.trim() {
        "normal" => Some(FontStyle::Normal),
        "italic" => Some(FontStyle::Italic),
        "oblique" => Some(FontStyle::Oblique),
        _ => None,
    }
}

/// Parse a text-decoration value: `none` or space-separated line keywords.
pub fn parse_text_decoration(value: &str) -> Option<TextDecoration> {
    let value = value.trim();
    if value == "none" {
        return Some(TextDecoration::NONE);
    }
    let mut decoration = TextDecoration::NONE;
    for word in value.split_whitespace() {
        match word {
            "underline" => decoration.underline = true,
            "overline" => decoration.overline = true,
            "line-through" => decoration.line_through = true,
            // Recognized but intentionally unimplemented.
            "blink" => {}
            _ => return None,
        }
    }
    Some(decoration)
}

/// Extract the path from a `url(...)` token, stripping quotes.
pub fn parse_url(value: &str) -> Option<&str> {
    let value = value.trim();
    let inner = value.strip_prefix("url(")?.strip_suffix(')')?;
    let inner = inner.trim();
    let inner = inner
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| inner.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
        .unwrap_or(inner);
    if inner.is_empty() {
        None
    } else {
        Some(inner)
    }
}

/// Expand a 1-4 value edge shorthand into `[top, right, bottom, left]`.
pub fn expand_edges<T: Copy>(values: &[T]) -> Option<[T; 4]> {
    match values {
        [all] => Some([*all; 4]),
        [vertical, horizontal] => Some([*vertical, *horizontal, *vertical, *horizontal]),
        [top, horizontal, bottom] => Some([*top, *horizontal, *bottom, *horizontal]),
        [top, right, bottom, left] => Some([*top, *right, *bottom, *left]),
        _ => None,
    }
}
