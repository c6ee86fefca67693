//! The stylesheet store: an ordered chain of loaded stylesheets flattened
//! into one rule list.
//!
//! Rules are immutable once loaded. Source order is a single monotonic
//! counter across the whole chain, so a later-loaded sheet outranks an
//! earlier one at equal specificity without a separate chain-priority key.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use shelltk_cssparser::{parse_stylesheet, Declaration, Selector};
use tracing::{debug, warn};

use crate::ThemeError;

/// One flattened style rule: a single selector plus the declarations of the
/// rule it came from. A source rule with a selector list becomes one
/// `StyleRule` per selector, sharing the declaration list.
#[derive(Debug, Clone)]
pub struct StyleRule {
    pub selector: Selector,
    pub declarations: Rc<Vec<Declaration>>,
    pub specificity: u32,
    pub source_order: u32,
    /// Index of the owning stylesheet, for `url(...)` base resolution.
    pub sheet: usize,
}

#[derive(Debug)]
struct SheetInfo {
    /// Display name for diagnostics: the file path or a caller-given label.
    name: String,
    /// Directory that relative `url(...)` values resolve against.
    base_dir: Option<PathBuf>,
}

/// An ordered set of stylesheets, highest priority last.
///
/// Built once at theme-load time, read-only afterwards. A theme switch
/// replaces the whole `Theme` via [`ThemeContext::set_theme`].
///
/// [`ThemeContext::set_theme`]: crate::ThemeContext::set_theme
#[derive(Debug, Default)]
pub struct Theme {
    sheets: Vec<SheetInfo>,
    rules: Vec<StyleRule>,
    next_order: u32,
}

impl Theme {
    /// An empty theme: every property resolves to its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a theme from stylesheet files, lowest priority first.
    ///
    /// A sheet that fails to read or parse is skipped with a warning; the
    /// load only fails hard when no sheet at all could be loaded.
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<Self, ThemeError> {
        let mut theme = Theme::new();
        let mut loaded = 0;
        for path in paths {
            match theme.load_stylesheet(path.as_ref()) {
                Ok(()) => loaded += 1,
                Err(err) => warn!(error = %err, "Skipping stylesheet"),
            }
        }
        if loaded == 0 && !paths.is_empty() {
            return Err(ThemeError::NoStylesheets);
        }
        Ok(theme)
    }

    /// Load one stylesheet file and append it to the chain.
    ///
    /// On failure the already-loaded sheets are untouched.
    pub fn load_stylesheet(&mut self, path: &Path) -> Result<(), ThemeError> {
        let source = std::fs::read_to_string(path).map_err(|source| ThemeError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let sheet = parse_stylesheet(&source).map_err(|source| ThemeError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        let base_dir = path.parent().map(Path::to_path_buf);
        self.ingest(sheet, path.display().to_string(), base_dir);
        Ok(())
    }

    /// Append a stylesheet from an in-memory source string.
    ///
    /// `name` is used in diagnostics; relative `url(...)` values in the
    /// sheet cannot be resolved.
    pub fn add_source(&mut self, name: &str, source: &str) -> Result<(), ThemeError> {
        let sheet = parse_stylesheet(source).map_err(|source| ThemeError::Parse {
            path: name.to_string(),
            source,
        })?;
        self.ingest(sheet, name.to_string(), None);
        Ok(())
    }

    fn ingest(&mut self, sheet: shelltk_cssparser::Stylesheet, name: String, base_dir: Option<PathBuf>) {
        let sheet_index = self.sheets.len();
        let mut rule_count = 0;
        for rule in sheet.rules {
            let declarations = Rc::new(rule.declarations);
            for selector in rule.selectors {
                let specificity = selector.specificity();
                self.rules.push(StyleRule {
                    selector,
                    declarations: Rc::clone(&declarations),
                    specificity,
                    source_order: self.next_order,
                    sheet: sheet_index,
                });
                self.next_order += 1;
                rule_count += 1;
            }
        }
        debug!(sheet = %name, rules = rule_count, "Loaded stylesheet");
        self.sheets.push(SheetInfo { name, base_dir });
    }

    /// Every rule whose rightmost compound could match an element of the
    /// given shape. No ordering guarantee; refinement against the full
    /// ancestor chain happens in the matcher.
    pub fn rules_matching<'a>(
        &'a self,
        element_type: &'a str,
        element_id: Option<&'a str>,
        element_classes: &'a [String],
    ) -> impl Iterator<Item = &'a StyleRule> {
        self.rules.iter().filter(move |rule| {
            let Some(subject) = rule.selector.subject() else {
                return false;
            };
            if let Some(element) = &subject.element {
                if element != element_type {
                    return false;
                }
            }
            if let Some(id) = &subject.id {
                if element_id != Some(id.as_str()) {
                    return false;
                }
            }
            subject
                .classes
                .iter()
                .all(|class| element_classes.iter().any(|c| c == class))
        })
    }

    /// Base directory for relative urls declared in sheet `index`.
    pub fn sheet_base(&self, index: usize) -> Option<&Path> {
        self.sheets.get(index)?.base_dir.as_deref()
    }

    /// Diagnostic name of sheet `index`.
    pub fn sheet_name(&self, index: usize) -> Option<&str> {
        self.sheets.get(index).map(|s| s.name.as_str())
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
