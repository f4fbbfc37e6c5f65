//! The instruction collection loaded for one category, and search over it.

use crate::models::Item;
use crate::render::format_link;

/// Items loaded for the currently selected category.
#[derive(Debug, Clone, Default)]
pub struct InstructionIndex {
    category: String,
    items: Vec<Item>,
    complete: bool,
}

impl InstructionIndex {
    pub fn new(category: impl Into<String>, items: Vec<Item>, complete: bool) -> Self {
        Self {
            category: category.into(),
            items,
            complete,
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// False when a page request failed while loading, so the index may be
    /// missing items.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn search(&self, term: &str) -> Vec<String> {
        search(&self.items, term)
    }
}

/// Case-insensitive substring search over item names.
///
/// Returns a formatted link for every item whose name contains `term`, in
/// collection order. An empty term matches everything.
pub fn search(items: &[Item], term: &str) -> Vec<String> {
    matching(items, term).map(format_link).collect()
}

/// The items [`search`] would link to.
pub fn matching<'a>(items: &'a [Item], term: &str) -> impl Iterator<Item = &'a Item> {
    let needle = term.to_lowercase();
    items
        .iter()
        .filter(move |item| item.name.to_lowercase().contains(&needle))
}
