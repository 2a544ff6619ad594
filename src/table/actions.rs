//! Row-level actions whose visibility and enabled state may depend on the row

use std::fmt;
use std::sync::Arc;

/// A flag that is either fixed or computed from `(row, row_index)`
pub enum Predicate<T> {
    Static(bool),
    Computed(Arc<dyn Fn(&T, usize) -> bool + Send + Sync>),
}

impl<T> Predicate<T> {
    pub fn computed(rule: impl Fn(&T, usize) -> bool + Send + Sync + 'static) -> Self {
        Predicate::Computed(Arc::new(rule))
    }

    /// Evaluated on every call; rules must be cheap and free of side effects
    pub fn eval(&self, row: &T, index: usize) -> bool {
        match self {
            Predicate::Static(value) => *value,
            Predicate::Computed(rule) => rule(row, index),
        }
    }
}

impl<T> Clone for Predicate<T> {
    fn clone(&self) -> Self {
        match self {
            Predicate::Static(value) => Predicate::Static(*value),
            Predicate::Computed(rule) => Predicate::Computed(rule.clone()),
        }
    }
}

impl<T> fmt::Debug for Predicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Static(value) => write!(f, "Static({})", value),
            Predicate::Computed(_) => write!(f, "Computed(..)"),
        }
    }
}

impl<T> From<bool> for Predicate<T> {
    fn from(value: bool) -> Self {
        Predicate::Static(value)
    }
}

#[derive(Debug, Clone)]
pub struct RowAction<T> {
    pub key: String,
    pub label: String,
    pub show: Predicate<T>,
    pub disabled: Predicate<T>,
}

impl<T> RowAction<T> {
    /// Always shown, never disabled
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            show: Predicate::Static(true),
            disabled: Predicate::Static(false),
        }
    }

    pub fn show_when(mut self, show: impl Into<Predicate<T>>) -> Self {
        self.show = show.into();
        self
    }

    pub fn disabled_when(mut self, disabled: impl Into<Predicate<T>>) -> Self {
        self.disabled = disabled.into();
        self
    }

    pub fn resolve(&self, row: &T, index: usize) -> Option<ResolvedAction> {
        if !self.show.eval(row, index) {
            return None;
        }
        Some(ResolvedAction {
            key: self.key.clone(),
            label: self.label.clone(),
            disabled: self.disabled.eval(row, index),
        })
    }
}

/// An action as it applies to one specific row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAction {
    pub key: String,
    pub label: String,
    pub disabled: bool,
}

/// Visible actions for a row, in declaration order
pub fn resolve_actions<T>(actions: &[RowAction<T>], row: &T, index: usize) -> Vec<ResolvedAction> {
    actions
        .iter()
        .filter_map(|action| action.resolve(row, index))
        .collect()
}
