//! Selector matching against a theme node and its ancestor chain.
//!
//! A simple selector is checked against the node itself; only combinators
//! walk the parent links. The descendant combinator backtracks over the
//! whole ancestor chain, the child combinator checks the direct parent.

use shelltk_cssparser::{Combinator, Selector, SelectorPart};

use crate::node::ThemeNode;

/// Whether `selector` matches `node`, honoring combinators against the
/// node's ancestor chain.
pub fn selector_matches(selector: &Selector, node: &ThemeNode) -> bool {
    match_parts(&selector.parts, node)
}

fn match_parts(parts: &[SelectorPart], node: &ThemeNode) -> bool {
    let (last, rest) = match parts.split_last() {
        Some(split) => split,
        None => return false,
    };
    if !compound_matches(last, node) {
        return false;
    }
    if rest.is_empty() {
        return true;
    }
    // `last.combinator` relates this compound to the one on its left.
    match last.combinator {
        Combinator::Child => match node.parent() {
            Some(parent) => match_parts(rest, parent),
            None => false,
        },
        Combinator::Descendant => {
            let mut ancestor = node.parent();
            while let Some(candidate) = ancestor {
                if match_parts(rest, candidate) {
                    return true;
                }
                ancestor = candidate.parent();
            }
            false
        }
        // The leftmost part never gets here.
        Combinator::None => false,
    }
}

/// Whether one compound matches the node itself: exact type or wildcard,
/// exact id, class containment (set semantics), exact pseudo-class.
fn compound_matches(part: &SelectorPart, node: &ThemeNode) -> bool {
    if let Some(element) = &part.element {
        if element != node.element_type() {
            return false;
        }
    }
    if let Some(id) = &part.id {
        if node.element_id() != Some(id.as_str()) {
            return false;
        }
    }
    for class in &part.classes {
        if !node.element_classes().iter().any(|c| c == class) {
            return false;
        }
    }
    if let Some(pseudo) = &part.pseudo_class {
        if node.pseudo_class() != Some(pseudo.as_str()) {
            return false;
        }
    }
    true
}
