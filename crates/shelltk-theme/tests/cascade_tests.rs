//! Cascade integration tests
//!
//! These tests exercise the full stylesheet → resolved-value pipeline:
//! - Stylesheet loading → rule flattening
//! - Selector matching → cascade ordering
//! - Inheritance and defaults
//! - Node caching and theme-switch invalidation

use std::rc::Rc;

use shelltk_theme::{Color, FontDescription, Side, Theme, ThemeContext};

fn context_with(sources: &[&str]) -> ThemeContext {
    let mut theme = Theme::new();
    for (i, source) in sources.iter().enumerate() {
        theme
            .add_source(&format!("sheet-{i}"), source)
            .expect("test stylesheet should parse");
    }
    let context = ThemeContext::new();
    context.set_theme(theme);
    context
}

#[test]
fn test_resolution_is_idempotent() {
    let context = context_with(&["Button { color: red; padding: 4px; font-size: 18px; }"]);
    let button = context.get_node(None, "Button", None, "", None);

    let first = (
        button.foreground_color(),
        button.padding(Side::Left),
        button.font().clone(),
    );
    for _ in 0..3 {
        assert_eq!(button.foreground_color(), first.0);
        assert_eq!(button.padding(Side::Left), first.1);
        assert_eq!(button.font(), &first.2);
    }
}

#[test]
fn test_id_outranks_class_regardless_of_order() {
    let context = context_with(&[
        "#ok { color: green; } .primary { color: red; } Button { color: blue; }",
    ]);
    let button = context.get_node(None, "Button", Some("ok"), "primary", None);
    assert_eq!(button.foreground_color(), Color::from_rgb(0, 128, 0));
}

#[test]
fn test_class_beats_type_regardless_of_order() {
    // Declaration order reversed between the two runs; specificity must
    // decide, not source order.
    for css in [
        "Button { color: red; } .warn { color: orange; }",
        ".warn { color: orange; } Button { color: red; }",
    ] {
        let context = context_with(&[css]);
        let button = context.get_node(None, "Button", None, "warn", None);
        assert_eq!(button.foreground_color(), Color::from_rgb(255, 165, 0));
    }
}

#[test]
fn test_source_order_breaks_specificity_ties() {
    let context = context_with(&[".a { color: red; } .b { color: blue; }"]);
    let node = context.get_node(None, "Box", None, "a b", None);
    assert_eq!(node.foreground_color(), Color::from_rgb(0, 0, 255));
}

#[test]
fn test_later_sheet_wins_at_equal_specificity() {
    let context = context_with(&[
        "Button { color: red; }",
        "Button { color: blue; }",
    ]);
    let button = context.get_node(None, "Button", None, "", None);
    assert_eq!(button.foreground_color(), Color::from_rgb(0, 0, 255));
}

#[test]
fn test_important_outranks_specificity() {
    let context = context_with(&["Button { color: red !important; } #ok { color: blue; }"]);
    let button = context.get_node(None, "Button", Some("ok"), "", None);
    assert_eq!(button.foreground_color(), Color::from_rgb(255, 0, 0));
}

#[test]
fn test_inheritable_vs_non_inheritable_fallback() {
    let context = context_with(&["Panel { color: red; padding: 8px; }"]);
    let panel = context.get_node(None, "Panel", None, "", None);
    let label = context.get_node(Some(&panel), "Label", None, "", None);

    // color inherits from the parent...
    assert_eq!(label.foreground_color(), Color::from_rgb(255, 0, 0));
    // ...padding falls back to the static default, not the parent's value.
    assert_eq!(panel.padding(Side::Top), 8.0);
    assert_eq!(label.padding(Side::Top), 0.0);
}

#[test]
fn test_inheritance_walks_whole_chain() {
    let context = context_with(&["stage { color: teal; }"]);
    let stage = context.root_node();
    let panel = context.get_node(Some(&stage), "Panel", None, "", None);
    let label = context.get_node(Some(&panel), "Label", None, "", None);
    assert_eq!(label.foreground_color(), Color::from_rgb(0, 128, 128));
}

#[test]
fn test_descendant_selectors_against_tree() {
    let context = context_with(&[
        "Panel Button { color: red; } Panel > Label { color: blue; } Button { color: black; }",
    ]);
    let panel = context.get_node(None, "Panel", None, "", None);
    let box_node = context.get_node(Some(&panel), "Box", None, "", None);
    let deep_button = context.get_node(Some(&box_node), "Button", None, "", None);
    let deep_label = context.get_node(Some(&box_node), "Label", None, "", None);

    // Descendant combinator reaches through Box; child does not.
    assert_eq!(deep_button.foreground_color(), Color::from_rgb(255, 0, 0));
    assert_eq!(deep_label.foreground_color(), Color::BLACK);
}

#[test]
fn test_structural_sharing_and_pseudo_distinctness() {
    let context = context_with(&[
        "Button { color: black; } Button:hover { color: red; }",
    ]);
    let a = context.get_node(None, "Button", None, "flat", None);
    let b = context.get_node(None, "Button", None, "flat", None);
    assert!(Rc::ptr_eq(&a, &b));

    let hover = context.get_node(None, "Button", None, "flat", Some("hover"));
    assert!(!Rc::ptr_eq(&a, &hover));
    assert_eq!(a.foreground_color(), Color::BLACK);
    assert_eq!(hover.foreground_color(), Color::from_rgb(255, 0, 0));
}

#[test]
fn test_theme_switch_produces_fresh_nodes() {
    let context = context_with(&["Button { color: red; }"]);
    let before = context.get_node(None, "Button", None, "", None);
    assert_eq!(before.foreground_color(), Color::from_rgb(255, 0, 0));

    let mut dark = Theme::new();
    dark.add_source("dark", "Button { color: white; }").unwrap();
    context.set_theme(dark);

    let after = context.get_node(None, "Button", None, "", None);
    assert!(!Rc::ptr_eq(&before, &after));
    assert_eq!(after.foreground_color(), Color::WHITE);
}

#[test]
fn test_malformed_declaration_degrades_gracefully() {
    let context = context_with(&[
        "Button { border-width: banana; color: red; padding: 2px; }",
    ]);
    let button = context.get_node(None, "Button", None, "", None);

    // The bad value resolves to the default instead of failing, and the
    // other declarations in the same rule still apply.
    assert_eq!(button.border_width(Side::Top), 0.0);
    assert_eq!(button.foreground_color(), Color::from_rgb(255, 0, 0));
    assert_eq!(button.padding(Side::Top), 2.0);
}

#[test]
fn test_font_subproperties_cascade_independently() {
    let context = context_with(&[
        "stage { font-family: Cantarell; font-size: 16px; }",
        "Label { font-weight: bold; }",
        ".small { font-size: 75%; }",
    ]);
    let stage = context.root_node();
    let label = context.get_node(Some(&stage), "Label", None, "small", None);

    let font = label.font();
    assert_eq!(font.family, "Cantarell");
    assert_eq!(font.size_px, 12.0);
    assert_eq!(font.weight, shelltk_theme::FontWeight::BOLD);
}

#[test]
fn test_loading_from_files() {
    let dir = std::env::temp_dir().join(format!(
        "shelltk-theme-test-{}",
        std::process::id()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    let good = dir.join("theme.css");
    let bad = dir.join("broken.css");
    std::fs::write(&good, "Button { background-image: url(\"bg.png\"); }").unwrap();
    std::fs::write(&bad, "Button { color: red;").unwrap();

    // The broken sheet is skipped; the good one still loads.
    let theme = Theme::load(&[bad.as_path(), good.as_path()]).unwrap();
    assert_eq!(theme.rule_count(), 1);

    let context = ThemeContext::new();
    context.set_theme(theme);
    let button = context.get_node(None, "Button", None, "", None);
    // Relative urls resolve against the stylesheet's directory.
    assert_eq!(button.background_image(), Some(dir.join("bg.png").as_path()));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_all_sheets_failing_is_a_hard_error() {
    let missing = std::env::temp_dir().join("shelltk-theme-no-such-file.css");
    assert!(Theme::load(&[missing.as_path()]).is_err());
}

#[test]
fn test_default_font_root() {
    let context = context_with(&["Label { }"]);
    let label = context.get_node(None, "Label", None, "", None);
    assert_eq!(label.font(), &FontDescription::default());
}
