//! The theme context: node deduplication and theme-chain lifecycle.
//!
//! The context indexes nodes weakly by identity tuple, so structurally
//! identical positions share one node and its warm cache while the
//! context itself never keeps a node alive. Replacing the theme is a
//! single atomic swap: the index is dropped wholesale and every
//! subsequent query produces a fresh node against the new chain.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use crate::node::{NodeId, ThemeNode};
use crate::theme::Theme;
use crate::values::FontDescription;

/// Notification payload for style-changed listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleChange {
    /// The active theme chain was replaced; cached nodes are stale and
    /// must be re-requested.
    ThemeChanged,
}

/// Handle for a connected style-changed listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerId(u64);

impl HandlerId {
    fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// Identity tuple for node deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct NodeKey {
    parent: Option<NodeId>,
    element_type: String,
    element_id: Option<String>,
    element_classes: Vec<String>,
    pseudo_class: Option<String>,
}

type ChangedHandler = Rc<dyn Fn(&StyleChange)>;

/// Owner of the active theme chain and the weak node index.
///
/// Explicitly constructed and passed by reference; there is no process
/// global. Single-threaded, cooperative with the UI event loop.
pub struct ThemeContext {
    theme: RefCell<Rc<Theme>>,
    font: RefCell<FontDescription>,
    nodes: RefCell<HashMap<NodeKey, Weak<ThemeNode>>>,
    /// Index size at which the next dead-entry sweep runs.
    sweep_at: Cell<usize>,
    handlers: RefCell<Vec<(HandlerId, ChangedHandler)>>,
}

/// Smallest index size that triggers a sweep of dead entries.
const SWEEP_FLOOR: usize = 64;

impl Default for ThemeContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ThemeContext {
    /// A context with an empty theme and the default font.
    pub fn new() -> Self {
        Self {
            theme: RefCell::new(Rc::new(Theme::new())),
            font: RefCell::new(FontDescription::default()),
            nodes: RefCell::new(HashMap::new()),
            sweep_at: Cell::new(SWEEP_FLOOR),
            handlers: RefCell::new(Vec::new()),
        }
    }

    /// The active theme chain.
    pub fn theme(&self) -> Rc<Theme> {
        Rc::clone(&self.theme.borrow())
    }

    /// Atomically replace the active theme chain.
    ///
    /// Every previously issued node is invalidated: the index is cleared,
    /// listeners are notified, and callers must re-request their nodes.
    /// Nodes already held keep resolving against the chain they were
    /// created with and must not be reused.
    pub fn set_theme(&self, theme: Theme) {
        debug!(rules = theme.rule_count(), "Switching theme");
        *self.theme.borrow_mut() = Rc::new(theme);
        self.nodes.borrow_mut().clear();
        self.sweep_at.set(SWEEP_FLOOR);
        self.emit(&StyleChange::ThemeChanged);
    }

    /// The default font, the root of font inheritance.
    pub fn default_font(&self) -> FontDescription {
        self.font.borrow().clone()
    }

    /// Replace the default font. Invalidates cached nodes like a theme
    /// switch, since any resolved font may depend on it.
    pub fn set_font(&self, font: FontDescription) {
        *self.font.borrow_mut() = font;
        self.nodes.borrow_mut().clear();
        self.sweep_at.set(SWEEP_FLOOR);
        self.emit(&StyleChange::ThemeChanged);
    }

    /// Get or create the node for one tree position.
    ///
    /// `element_classes` is a space-separated class list. Two calls with
    /// identical (parent, type, id, classes, pseudo-class) return the
    /// same instance while anyone still holds it; the index itself is
    /// weak and never extends a node's lifetime.
    pub fn get_node(
        &self,
        parent: Option<&Rc<ThemeNode>>,
        element_type: &str,
        element_id: Option<&str>,
        element_classes: &str,
        pseudo_class: Option<&str>,
    ) -> Rc<ThemeNode> {
        let classes: Vec<String> = element_classes
            .split_whitespace()
            .map(str::to_string)
            .collect();
        let key = NodeKey {
            parent: parent.map(|p| p.id()),
            element_type: element_type.to_string(),
            element_id: element_id.map(str::to_string),
            element_classes: classes.clone(),
            pseudo_class: pseudo_class.map(str::to_string),
        };

        {
            let mut nodes = self.nodes.borrow_mut();
            if let Some(weak) = nodes.get(&key) {
                match weak.upgrade() {
                    Some(existing) => return existing,
                    // All strong references dropped; reclaim the slot.
                    None => {
                        nodes.remove(&key);
                    }
                }
            }
            // Transient identities (dynamic ids, pseudo-class churn) leave
            // dead entries behind under ever-fresh keys. Sweep them out
            // whenever the index outgrows its last swept size.
            if nodes.len() >= self.sweep_at.get() {
                nodes.retain(|_, weak| weak.strong_count() > 0);
                self.sweep_at.set((nodes.len() * 2).max(SWEEP_FLOOR));
            }
        }

        let node = Rc::new(ThemeNode::new(
            parent.cloned(),
            self.theme(),
            element_type.to_string(),
            element_id.map(str::to_string),
            classes,
            pseudo_class.map(str::to_string),
            self.default_font(),
        ));
        self.nodes
            .borrow_mut()
            .insert(key, Rc::downgrade(&node));
        node
    }

    /// The node for the stage itself: no parent, element name `stage`.
    pub fn root_node(&self) -> Rc<ThemeNode> {
        self.get_node(None, "stage", None, "", None)
    }

    /// Register a style-changed listener. Fired on theme and default-font
    /// switches; pseudo-class transitions are the widget layer's job (it
    /// re-requests a node with the new state).
    pub fn connect_changed(&self, handler: impl Fn(&StyleChange) + 'static) -> HandlerId {
        let id = HandlerId::new();
        self.handlers.borrow_mut().push((id, Rc::new(handler)));
        id
    }

    /// Remove a previously registered listener.
    pub fn disconnect_changed(&self, id: HandlerId) {
        self.handlers.borrow_mut().retain(|(hid, _)| *hid != id);
    }

    fn emit(&self, change: &StyleChange) {
        // Snapshot so a handler may connect/disconnect reentrantly.
        let handlers: Vec<ChangedHandler> = self
            .handlers
            .borrow()
            .iter()
            .map(|(_, h)| Rc::clone(h))
            .collect();
        for handler in handlers {
            handler(change);
        }
    }

    /// Number of live entries in the node index.
    pub fn node_count(&self) -> usize {
        self.nodes
            .borrow()
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }
}
