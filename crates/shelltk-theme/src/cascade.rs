//! The cascade: collecting matching rules for a node and ordering their
//! declarations so that the highest-priority declaration wins.
//!
//! Sort key is (specificity, source order), both ascending, with
//! `!important` declarations appended after all normal ones. The flattened
//! list is applied first-to-last by the node getters, so "later wins"
//! falls out of plain iteration; per-property lookups walk it from the end
//! and skip declarations whose value fails to parse.

use smallvec::SmallVec;
use tracing::{trace, warn};

use crate::matcher::selector_matches;
use crate::node::ThemeNode;
use crate::theme::{StyleRule, Theme};
use crate::values::{self, Color, Length};

/// One declaration that survived matching, in final cascade order.
#[derive(Debug, Clone)]
pub(crate) struct MatchedDecl {
    pub property: String,
    pub value: String,
    /// Owning stylesheet, for relative url resolution.
    pub sheet: usize,
}

/// Collect every declaration applying to `node`, flattened into cascade
/// order (lowest priority first).
pub(crate) fn collect_declarations(theme: &Theme, node: &ThemeNode) -> Vec<MatchedDecl> {
    let mut matched: SmallVec<[&StyleRule; 16]> = SmallVec::new();
    for rule in theme.rules_matching(
        node.element_type(),
        node.element_id(),
        node.element_classes(),
    ) {
        if selector_matches(&rule.selector, node) {
            matched.push(rule);
        }
    }
    matched.sort_by_key(|rule| (rule.specificity, rule.source_order));

    trace!(
        element = node.element_type(),
        rules = matched.len(),
        "Collected matching rules"
    );

    let mut declarations = Vec::new();
    for important in [false, true] {
        for rule in &matched {
            for decl in rule.declarations.iter() {
                if decl.important == important {
                    declarations.push(MatchedDecl {
                        property: decl.property.clone(),
                        value: decl.value.clone(),
                        sheet: rule.sheet,
                    });
                }
            }
        }
    }
    declarations
}

/// Iterate declarations of `property` from highest to lowest priority.
pub(crate) fn candidates<'a>(
    declarations: &'a [MatchedDecl],
    property: &'a str,
) -> impl Iterator<Item = &'a MatchedDecl> {
    declarations
        .iter()
        .rev()
        .filter(move |decl| decl.property == property)
}

/// Resolve `property` to a color. Declarations with unparseable values are
/// skipped, falling through to the next-highest-priority match.
pub(crate) fn resolve_color(declarations: &[MatchedDecl], property: &str) -> Option<Color> {
    for decl in candidates(declarations, property) {
        match values::parse_color(&decl.value) {
            Some(color) => return Some(color),
            None => {
                warn!(property, value = %decl.value, "Invalid color value, skipping");
            }
        }
    }
    None
}

/// Resolve `property` to a pixel length against `em_base` (the element's
/// font size). Percentages carry no size context here and are skipped.
pub(crate) fn resolve_length(
    declarations: &[MatchedDecl],
    property: &str,
    em_base: f32,
) -> Option<f32> {
    for decl in candidates(declarations, property) {
        match values::parse_length(&decl.value).and_then(|l| l.to_px(em_base)) {
            Some(px) => return Some(px),
            None => {
                warn!(property, value = %decl.value, "Invalid length value, skipping");
            }
        }
    }
    None
}

/// Resolve `property` to a plain floating-point number.
pub(crate) fn resolve_double(declarations: &[MatchedDecl], property: &str) -> Option<f64> {
    for decl in candidates(declarations, property) {
        match decl.value.trim().parse::<f64>() {
            Ok(value) => return Some(value),
            Err(_) => {
                warn!(property, value = %decl.value, "Invalid numeric value, skipping");
            }
        }
    }
    None
}

/// Resolve a font-size declaration value against the parent font size.
/// Unlike other lengths, `em` and `%` are relative to the parent here.
pub(crate) fn resolve_font_size(value: &str, parent_size: f32) -> Option<f32> {
    match values::parse_length(value)? {
        Length::Percent(pct) => Some(pct / 100.0 * parent_size),
        other => other.to_px(parent_size),
    }
}
