//! The per-element resolved-style object.
//!
//! A `ThemeNode` is tied to one tree position: element type, id, class
//! list, pseudo-class, parent node and theme chain. Specific getters
//! resolve through the cascade on first call and cache the result; the
//! generic getters resolve on every call but accept arbitrary property
//! names, including unknown properties stored verbatim by the parser.
//!
//! A node never mutates after a property is resolved. Invalidation is
//! disposal: the context drops its index on theme switch and fresh nodes
//! are created on demand.

use std::cell::OnceCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use smallvec::SmallVec;
use tracing::warn;

use crate::cascade::{self, MatchedDecl};
use crate::theme::Theme;
use crate::values::{
    self, Color, FontDescription, Side, TextDecoration,
};

/// Unique identity of a theme node, used as the parent component of the
/// context's dedup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u64);

impl NodeId {
    fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// A background image with unscaled border widths, from the
/// `-shell-background-image` property.
#[derive(Debug, Clone, PartialEq)]
pub struct ThemeImage {
    pub file: PathBuf,
    pub border_top: f32,
    pub border_right: f32,
    pub border_bottom: f32,
    pub border_left: f32,
}

#[derive(Debug, Clone, Copy)]
struct Border {
    widths: [f32; 4],
    colors: [Color; 4],
}

/// Resolved style for one element position in the widget tree.
#[derive(Debug)]
pub struct ThemeNode {
    id: NodeId,
    parent: Option<Rc<ThemeNode>>,
    theme: Rc<Theme>,
    element_type: String,
    element_id: Option<String>,
    element_classes: Vec<String>,
    pseudo_class: Option<String>,
    /// Context default font, root of font inheritance.
    default_font: FontDescription,

    // Lazily filled caches. Each property resolves at most once.
    declarations: OnceCell<Vec<MatchedDecl>>,
    foreground_color: OnceCell<Color>,
    background_color: OnceCell<Color>,
    background_image: OnceCell<Option<PathBuf>>,
    background_theme_image: OnceCell<Option<ThemeImage>>,
    border: OnceCell<Border>,
    paddings: OnceCell<[f32; 4]>,
    font: OnceCell<FontDescription>,
    text_decoration: OnceCell<TextDecoration>,
}

impl ThemeNode {
    pub(crate) fn new(
        parent: Option<Rc<ThemeNode>>,
        theme: Rc<Theme>,
        element_type: String,
        element_id: Option<String>,
        element_classes: Vec<String>,
        pseudo_class: Option<String>,
        default_font: FontDescription,
    ) -> Self {
        Self {
            id: NodeId::new(),
            parent,
            theme,
            element_type,
            element_id,
            element_classes,
            pseudo_class,
            default_font,
            declarations: OnceCell::new(),
            foreground_color: OnceCell::new(),
            background_color: OnceCell::new(),
            background_image: OnceCell::new(),
            background_theme_image: OnceCell::new(),
            border: OnceCell::new(),
            paddings: OnceCell::new(),
            font: OnceCell::new(),
            text_decoration: OnceCell::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn parent(&self) -> Option<&Rc<ThemeNode>> {
        self.parent.as_ref()
    }

    pub fn theme(&self) -> &Rc<Theme> {
        &self.theme
    }

    pub fn element_type(&self) -> &str {
        &self.element_type
    }

    pub fn element_id(&self) -> Option<&str> {
        self.element_id.as_deref()
    }

    pub fn element_classes(&self) -> &[String] {
        &self.element_classes
    }

    pub fn pseudo_class(&self) -> Option<&str> {
        self.pseudo_class.as_deref()
    }

    /// Matched declarations in cascade order, collected on first use.
    fn declarations(&self) -> &[MatchedDecl] {
        self.declarations
            .get_or_init(|| cascade::collect_declarations(&self.theme, self))
    }

    // ---- Specific getters: resolved once, cached ----

    /// The `color` property. Inherits; defaults to black at the root.
    pub fn foreground_color(&self) -> Color {
        *self.foreground_color.get_or_init(|| {
            cascade::resolve_color(self.declarations(), "color")
                .or_else(|| self.parent.as_ref().map(|p| p.foreground_color()))
                .unwrap_or(Color::BLACK)
        })
    }

    /// The `background-color` property (or the `background` shorthand).
    /// Does not inherit; defaults to transparent.
    pub fn background_color(&self) -> Color {
        *self
            .background_color
            .get_or_init(|| self.resolve_background().0)
    }

    /// The `background-image` url, resolved against the declaring
    /// stylesheet's directory. Does not inherit.
    pub fn background_image(&self) -> Option<&Path> {
        self.background_image
            .get_or_init(|| self.resolve_background().1)
            .as_deref()
    }

    /// The `-shell-background-image` property: an image with unscaled
    /// border widths for nine-slice rendering.
    pub fn background_theme_image(&self) -> Option<&ThemeImage> {
        self.background_theme_image
            .get_or_init(|| {
                for decl in cascade::candidates(self.declarations(), "-shell-background-image") {
                    match self.parse_theme_image(decl) {
                        Some(image) => return Some(image),
                        None => {
                            warn!(value = %decl.value, "Invalid -shell-background-image value, skipping");
                        }
                    }
                }
                None
            })
            .as_ref()
    }

    /// Border width of one side in pixels. Does not inherit; defaults to 0.
    pub fn border_width(&self, side: Side) -> f32 {
        self.resolve_border().widths[side.index()]
    }

    /// Border color of one side. Defaults to the foreground color.
    pub fn border_color(&self, side: Side) -> Color {
        self.resolve_border().colors[side.index()]
    }

    /// Padding of one side in pixels. Does not inherit; defaults to 0.
    pub fn padding(&self, side: Side) -> f32 {
        self.paddings.get_or_init(|| {
            let em = self.font_size();
            let mut paddings = [0.0f32; 4];
            for decl in self.declarations() {
                match decl.property.as_str() {
                    "padding" => match parse_edge_lengths(&decl.value, em) {
                        Some(edges) => paddings = edges,
                        None => warn!(value = %decl.value, "Invalid padding value, skipping"),
                    },
                    "padding-top" | "padding-right" | "padding-bottom" | "padding-left" => {
                        let side = side_of(&decl.property);
                        match parse_px(&decl.value, em) {
                            Some(px) => paddings[side.index()] = px,
                            None => warn!(property = %decl.property, value = %decl.value, "Invalid padding value, skipping"),
                        }
                    }
                    _ => {}
                }
            }
            paddings
        })[side.index()]
    }

    /// The composed font: family, size, weight and style cascade as
    /// independent sub-properties, inheriting from the parent font (or the
    /// context default at the root), then merge here. A partial override
    /// keeps the inherited remainder.
    pub fn font(&self) -> &FontDescription {
        self.font.get_or_init(|| {
            let parent_font = match &self.parent {
                Some(parent) => parent.font().clone(),
                None => self.default_font.clone(),
            };
            let mut font = parent_font.clone();
            for decl in self.declarations() {
                match decl.property.as_str() {
                    "font-family" => font.family = decl.value.trim().to_string(),
                    "font-size" => {
                        match cascade::resolve_font_size(&decl.value, parent_font.size_px) {
                            Some(px) => font.size_px = px,
                            None => warn!(value = %decl.value, "Invalid font-size value, skipping"),
                        }
                    }
                    "font-weight" => match values::parse_font_weight(&decl.value) {
                        Some(weight) => font.weight = weight,
                        None => warn!(value = %decl.value, "Invalid font-weight value, skipping"),
                    },
                    "font-style" => match values::parse_font_style(&decl.value) {
                        Some(style) => font.style = style,
                        None => warn!(value = %decl.value, "Invalid font-style value, skipping"),
                    },
                    _ => {}
                }
            }
            font
        })
    }

    /// Text decoration flags. Not inherited; each element sets its own.
    pub fn text_decoration(&self) -> TextDecoration {
        *self.text_decoration.get_or_init(|| {
            for decl in cascade::candidates(self.declarations(), "text-decoration") {
                match values::parse_text_decoration(&decl.value) {
                    Some(decoration) => return decoration,
                    None => {
                        warn!(value = %decl.value, "Invalid text-decoration value, skipping");
                    }
                }
            }
            TextDecoration::NONE
        })
    }

    // ---- Generic getters: arbitrary property names, never cached ----

    /// Resolve any property name to a color. Returns `None` when unset,
    /// which is distinct from resolving to transparent.
    pub fn get_color(&self, property: &str, inherit: bool) -> Option<Color> {
        cascade::resolve_color(self.declarations(), property).or_else(|| {
            if inherit {
                self.parent.as_ref()?.get_color(property, true)
            } else {
                None
            }
        })
    }

    /// Resolve any property name to a pixel length. `em` resolves against
    /// this element's own font size.
    pub fn get_length(&self, property: &str, inherit: bool) -> Option<f32> {
        cascade::resolve_length(self.declarations(), property, self.font_size()).or_else(|| {
            if inherit {
                self.parent.as_ref()?.get_length(property, true)
            } else {
                None
            }
        })
    }

    /// Resolve any property name to a plain number.
    pub fn get_double(&self, property: &str, inherit: bool) -> Option<f64> {
        cascade::resolve_double(self.declarations(), property).or_else(|| {
            if inherit {
                self.parent.as_ref()?.get_double(property, true)
            } else {
                None
            }
        })
    }

    // ---- Internals ----

    fn font_size(&self) -> f32 {
        self.font().size_px
    }

    fn resolve_background(&self) -> (Color, Option<PathBuf>) {
        let mut color = Color::TRANSPARENT;
        let mut image: Option<PathBuf> = None;
        for decl in self.declarations() {
            match decl.property.as_str() {
                "background-color" => match values::parse_color(&decl.value) {
                    Some(c) => color = c,
                    None => warn!(value = %decl.value, "Invalid background-color value, skipping"),
                },
                "background-image" => {
                    if decl.value.trim() == "none" {
                        image = None;
                    } else {
                        match values::parse_url(&decl.value) {
                            Some(url) => image = Some(self.resolve_file(url, decl.sheet)),
                            None => warn!(value = %decl.value, "Invalid background-image value, skipping"),
                        }
                    }
                }
                "background" => match self.parse_background_shorthand(decl) {
                    Some((c, img)) => {
                        color = c;
                        image = img;
                    }
                    None => warn!(value = %decl.value, "Invalid background value, skipping"),
                },
                _ => {}
            }
        }
        (color, image)
    }

    /// `background: [color] [url(...)|none]` in any order. The shorthand
    /// resets both sub-properties before applying its tokens.
    fn parse_background_shorthand(&self, decl: &MatchedDecl) -> Option<(Color, Option<PathBuf>)> {
        let mut color = Color::TRANSPARENT;
        let mut image = None;
        for token in decl.value.split_whitespace() {
            if token == "none" {
                image = None;
            } else if let Some(url) = values::parse_url(token) {
                image = Some(self.resolve_file(url, decl.sheet));
            } else if let Some(c) = values::parse_color(token) {
                color = c;
            } else {
                return None;
            }
        }
        Some((color, image))
    }

    /// `-shell-background-image: url(...) [t [r [b [l]]]]`.
    fn parse_theme_image(&self, decl: &MatchedDecl) -> Option<ThemeImage> {
        let mut tokens = decl.value.split_whitespace();
        let url = values::parse_url(tokens.next()?)?;
        let file = self.resolve_file(url, decl.sheet);

        let widths: SmallVec<[f32; 4]> = tokens
            .map(|token| parse_px(token, self.font_size()))
            .collect::<Option<_>>()?;
        let [top, right, bottom, left] = if widths.is_empty() {
            [0.0; 4]
        } else {
            values::expand_edges(&widths)?
        };
        Some(ThemeImage {
            file,
            border_top: top,
            border_right: right,
            border_bottom: bottom,
            border_left: left,
        })
    }

    fn resolve_border(&self) -> Border {
        *self.border.get_or_init(|| {
            let em = self.font_size();
            let mut border = Border {
                widths: [0.0; 4],
                colors: [self.foreground_color(); 4],
            };
            for decl in self.declarations() {
                match decl.property.as_str() {
                    "border" => match parse_border_shorthand(&decl.value, em) {
                        Some((width, color)) => {
                            border.widths = [width; 4];
                            if let Some(color) = color {
                                border.colors = [color; 4];
                            }
                        }
                        None => warn!(value = %decl.value, "Invalid border value, skipping"),
                    },
                    "border-width" => match parse_edge_lengths(&decl.value, em) {
                        Some(edges) => border.widths = edges,
                        None => warn!(value = %decl.value, "Invalid border-width value, skipping"),
                    },
                    "border-color" => match parse_edge_colors(&decl.value) {
                        Some(colors) => border.colors = colors,
                        None => warn!(value = %decl.value, "Invalid border-color value, skipping"),
                    },
                    "border-top-width" | "border-right-width" | "border-bottom-width"
                    | "border-left-width" => {
                        let side = side_of(&decl.property);
                        match parse_px(&decl.value, em) {
                            Some(px) => border.widths[side.index()] = px,
                            None => warn!(property = %decl.property, value = %decl.value, "Invalid border width, skipping"),
                        }
                    }
                    "border-top-color" | "border-right-color" | "border-bottom-color"
                    | "border-left-color" => {
                        let side = side_of(&decl.property);
                        match values::parse_color(&decl.value) {
                            Some(color) => border.colors[side.index()] = color,
                            None => warn!(property = %decl.property, value = %decl.value, "Invalid border color, skipping"),
                        }
                    }
                    _ => {}
                }
            }
            border
        })
    }

    fn resolve_file(&self, url: &str, sheet: usize) -> PathBuf {
        let path = Path::new(url);
        if path.is_absolute() {
            return path.to_path_buf();
        }
        match self.theme.sheet_base(sheet) {
            Some(base) => base.join(path),
            None => path.to_path_buf(),
        }
    }
}

fn parse_px(value: &str, em_base: f32) -> Option<f32> {
    values::parse_length(value)?.to_px(em_base)
}

fn parse_edge_lengths(value: &str, em_base: f32) -> Option<[f32; 4]> {
    let lengths: SmallVec<[f32; 4]> = value
        .split_whitespace()
        .map(|token| parse_px(token, em_base))
        .collect::<Option<_>>()?;
    values::expand_edges(&lengths)
}

fn parse_edge_colors(value: &str) -> Option<[Color; 4]> {
    let colors: SmallVec<[Color; 4]> = value
        .split_whitespace()
        .map(values::parse_color)
        .collect::<Option<_>>()?;
    values::expand_edges(&colors)
}

/// `border: <width> [solid|none] [color]`, any subset, width first.
/// A `none` style zeroes the width.
fn parse_border_shorthand(value: &str, em_base: f32) -> Option<(f32, Option<Color>)> {
    let mut width = 0.0;
    let mut color = None;
    let mut hidden = false;
    for token in value.split_whitespace() {
        match token {
            "solid" => {}
            "none" | "hidden" => hidden = true,
            token => {
                if let Some(c) = values::parse_color(token) {
                    color = Some(c);
                } else if let Some(px) = parse_px(token, em_base) {
                    width = px;
                } else {
                    return None;
                }
            }
        }
    }
    if hidden {
        width = 0.0;
    }
    Some((width, color))
}

fn side_of(property: &str) -> Side {
    for side in Side::ALL {
        if property.contains(side.name()) {
            return side;
        }
    }
    // Property lists above only route *-top/right/bottom/left names here.
    Side::Top
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ThemeContext;
    use crate::theme::Theme;
    use crate::values::{FontStyle, FontWeight};

    fn context_with(css: &str) -> ThemeContext {
        let mut theme = Theme::new();
        theme.add_source("test", css).unwrap();
        let context = ThemeContext::new();
        context.set_theme(theme);
        context
    }

    #[test]
    fn test_foreground_inherits_background_does_not() {
        let context = context_with("Panel { color: red; background-color: blue; }");
        let panel = context.get_node(None, "Panel", None, "", None);
        let label = context.get_node(Some(&panel), "Label", None, "", None);

        assert_eq!(label.foreground_color(), Color::from_rgb(255, 0, 0));
        assert_eq!(label.background_color(), Color::TRANSPARENT);
        assert_eq!(panel.background_color(), Color::from_rgb(0, 0, 255));
    }

    #[test]
    fn test_border_shorthand_and_overrides() {
        let context = context_with(
            "Button { border: 2px solid black; border-left-width: 4px; border-top-color: red; }",
        );
        let button = context.get_node(None, "Button", None, "", None);
        assert_eq!(button.border_width(Side::Top), 2.0);
        assert_eq!(button.border_width(Side::Left), 4.0);
        assert_eq!(button.border_color(Side::Top), Color::from_rgb(255, 0, 0));
        assert_eq!(button.border_color(Side::Bottom), Color::BLACK);
    }

    #[test]
    fn test_malformed_border_width_falls_back() {
        let context =
            context_with("Button { border-width: banana; background-color: #abc; }");
        let button = context.get_node(None, "Button", None, "", None);
        // The bad declaration degrades to the default without dropping
        // the sibling declaration.
        assert_eq!(button.border_width(Side::Top), 0.0);
        assert_eq!(button.background_color(), Color::from_rgb(170, 187, 204));
    }

    #[test]
    fn test_padding_edges() {
        let context = context_with("Box { padding: 1px 2px 3px 4px; padding-right: 9px; }");
        let node = context.get_node(None, "Box", None, "", None);
        assert_eq!(node.padding(Side::Top), 1.0);
        assert_eq!(node.padding(Side::Right), 9.0);
        assert_eq!(node.padding(Side::Bottom), 3.0);
        assert_eq!(node.padding(Side::Left), 4.0);
    }

    #[test]
    fn test_font_partial_override_keeps_inherited_parts() {
        let context = context_with(
            "Panel { font-family: Cantarell; font-size: 20px; } \
             Panel Label { font-weight: bold; }",
        );
        let panel = context.get_node(None, "Panel", None, "", None);
        let label = context.get_node(Some(&panel), "Label", None, "", None);

        let font = label.font();
        assert_eq!(font.family, "Cantarell");
        assert_eq!(font.size_px, 20.0);
        assert_eq!(font.weight, FontWeight::BOLD);
        assert_eq!(font.style, FontStyle::Normal);
    }

    #[test]
    fn test_font_size_em_relative_to_parent() {
        let context = context_with("Panel { font-size: 20px; } Label { font-size: 1.5em; }");
        let panel = context.get_node(None, "Panel", None, "", None);
        let label = context.get_node(Some(&panel), "Label", None, "", None);
        assert_eq!(label.font().size_px, 30.0);
    }

    #[test]
    fn test_em_lengths_use_own_font_size() {
        let context = context_with("Box { font-size: 10px; padding: 2em; }");
        let node = context.get_node(None, "Box", None, "", None);
        assert_eq!(node.padding(Side::Top), 20.0);
    }

    #[test]
    fn test_generic_getters_absent_vs_set() {
        let context = context_with("Box { -shell-spacing: 12px; opacity: 0.5; }");
        let node = context.get_node(None, "Box", None, "", None);

        // Unknown properties are stored verbatim and reachable generically.
        assert_eq!(node.get_length("-shell-spacing", false), Some(12.0));
        assert_eq!(node.get_double("opacity", false), Some(0.5));
        // Absent is None, not zero.
        assert_eq!(node.get_length("-shell-gap", false), None);

        let child = context.get_node(Some(&node), "Inner", None, "", None);
        assert_eq!(child.get_length("-shell-spacing", false), None);
        assert_eq!(child.get_length("-shell-spacing", true), Some(12.0));
    }

    #[test]
    fn test_text_decoration() {
        let context = context_with("Link { text-decoration: underline; }");
        let link = context.get_node(None, "Link", None, "", None);
        assert_eq!(
            link.text_decoration(),
            TextDecoration {
                underline: true,
                overline: false,
                line_through: false
            }
        );

        // Not inherited.
        let inner = context.get_node(Some(&link), "Label", None, "", None);
        assert!(inner.text_decoration().is_none());
    }

    #[test]
    fn test_background_shorthand_resets_image() {
        let context = context_with(
            "Box { background-image: url(\"a.png\"); background: #112233; }",
        );
        let node = context.get_node(None, "Box", None, "", None);
        assert_eq!(node.background_color(), Color::from_rgb(0x11, 0x22, 0x33));
        assert_eq!(node.background_image(), None);
    }

    #[test]
    fn test_theme_image_borders() {
        let context = context_with(
            "Box { -shell-background-image: url(\"frame.png\") 4px 6px; }",
        );
        let node = context.get_node(None, "Box", None, "", None);
        let image = node.background_theme_image().unwrap();
        assert_eq!(image.file, PathBuf::from("frame.png"));
        assert_eq!(image.border_top, 4.0);
        assert_eq!(image.border_right, 6.0);
        assert_eq!(image.border_bottom, 4.0);
        assert_eq!(image.border_left, 6.0);
    }
}
