//! # ShellTk Theme
//!
//! CSS-like cascade and style resolution for the ShellTk widget toolkit.
//!
//! ## Design Goals
//!
//! 1. **Cascade**: collect matching rules, rank by specificity then source
//!    order, later wins ties
//! 2. **Inheritance**: color and font fall through to the parent node;
//!    box-model properties fall back to static defaults
//! 3. **Lazy caching**: a node resolves each property once; generic getters
//!    trade the cache for arbitrary property names
//! 4. **Structural sharing**: one node per (parent, type, id, classes,
//!    pseudo-class) position, deduplicated by the theme context
//! 5. **Graceful degradation**: a bad rule or value never blocks rendering
//!
//! The widget layer supplies element identity and queries typed getters;
//! it never participates in cascade computation. All resolution runs
//! synchronously on the UI thread.

use thiserror::Error;

mod cascade;
mod context;
mod matcher;
mod node;
mod theme;
mod values;

pub use context::{HandlerId, StyleChange, ThemeContext};
pub use node::{NodeId, ThemeImage, ThemeNode};
pub use shelltk_cssparser::{Combinator, Declaration, ParseError, Selector, SelectorPart};
pub use theme::{StyleRule, Theme};
pub use values::{
    parse_color, parse_length, Color, FontDescription, FontStyle, FontWeight, Length, Side,
    TextDecoration,
};

/// Errors that can occur in theme operations.
#[derive(Error, Debug)]
pub enum ThemeError {
    #[error("Parse error in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: ParseError,
    },

    #[error("Failed to read stylesheet {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No stylesheet could be loaded")]
    NoStylesheets,
}
