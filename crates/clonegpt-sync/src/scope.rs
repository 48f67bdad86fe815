//! Dispatch of an action to this tab, the other tabs, or both.

use serde::{Deserialize, Serialize};

/// Which tabs an action applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TabScope {
    ThisTab,
    OtherTabs,
    #[default]
    Both,
}

impl TabScope {
    pub fn includes_this_tab(self) -> bool {
        matches!(self, Self::ThisTab | Self::Both)
    }

    pub fn includes_other_tabs(self) -> bool {
        matches!(self, Self::OtherTabs | Self::Both)
    }
}

/// Optional per-scope actions. A missing action for a selected scope is skipped.
#[derive(Default)]
pub struct TabScopeHandlers<'a> {
    this_tab: Option<Box<dyn FnOnce() + 'a>>,
    other_tabs: Option<Box<dyn FnOnce() + 'a>>,
}

impl<'a> TabScopeHandlers<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn this_tab(mut self, f: impl FnOnce() + 'a) -> Self {
        self.this_tab = Some(Box::new(f));
        self
    }

    /// Typically posts to the sync bus.
    pub fn other_tabs(mut self, f: impl FnOnce() + 'a) -> Self {
        self.other_tabs = Some(Box::new(f));
        self
    }

    /// Runs the local action first, then the broadcast.
    pub fn run(self, scope: TabScope) {
        if scope.includes_this_tab() {
            if let Some(f) = self.this_tab {
                f();
            }
        }
        if scope.includes_other_tabs() {
            if let Some(f) = self.other_tabs {
                f();
            }
        }
    }
}

pub fn tab_scope(scope: TabScope, handlers: TabScopeHandlers<'_>) {
    handlers.run(scope);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_both_runs_each_once_in_order() {
        let order = std::cell::RefCell::new(Vec::new());
        tab_scope(
            TabScope::Both,
            TabScopeHandlers::new()
                .this_tab(|| order.borrow_mut().push("this"))
                .other_tabs(|| order.borrow_mut().push("other")),
        );
        assert_eq!(*order.borrow(), vec!["this", "other"]);
    }

    #[test]
    fn test_missing_handler_is_skipped() {
        let other = Cell::new(0);
        tab_scope(
            TabScope::ThisTab,
            TabScopeHandlers::new().other_tabs(|| other.set(other.get() + 1)),
        );
        assert_eq!(other.get(), 0);

        tab_scope(TabScope::OtherTabs, TabScopeHandlers::new());
    }

    #[test]
    fn test_single_scopes() {
        let this = Cell::new(0);
        let other = Cell::new(0);
        let (t, o) = (&this, &other);
        let handlers = move || {
            TabScopeHandlers::new()
                .this_tab(move || t.set(t.get() + 1))
                .other_tabs(move || o.set(o.get() + 1))
        };

        tab_scope(TabScope::ThisTab, handlers());
        tab_scope(TabScope::OtherTabs, handlers());
        assert_eq!((this.get(), other.get()), (1, 1));
        assert_eq!(TabScope::default(), TabScope::Both);
    }
}
