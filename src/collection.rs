//! The snippet collection view
//!
//! Holds the authoritative snippet list as last loaded from the store plus
//! the view state over it: free-text search, type filter, category chips
//! and the current selection. Filtering is plain predicate logic.

use crate::snippet::{Snippet, SnippetId, SnippetType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeFilter {
    #[default]
    All,
    Favorites,
    Kind(SnippetType),
}

impl TypeFilter {
    /// Cycle order for the filter key: All → components → websites →
    /// templates → favorites → All.
    pub fn next(self) -> Self {
        match self {
            Self::All => Self::Kind(SnippetType::Component),
            Self::Kind(SnippetType::Component) => Self::Kind(SnippetType::Website),
            Self::Kind(SnippetType::Website) => Self::Kind(SnippetType::Template),
            Self::Kind(SnippetType::Template) => Self::Favorites,
            Self::Favorites => Self::All,
        }
    }

    fn matches(self, snippet: &Snippet) -> bool {
        match self {
            Self::All => true,
            Self::Favorites => snippet.is_favorite,
            Self::Kind(kind) => snippet.snippet_type == kind,
        }
    }
}

#[derive(Default)]
pub struct CollectionView {
    snippets: Vec<Snippet>,
    pub search: String,
    pub type_filter: TypeFilter,
    /// None selects all categories.
    pub category: Option<String>,
    selected: usize,
    /// Delete staged behind the confirmation gate.
    pending_delete: Option<SnippetId>,
}

impl CollectionView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the collection with the store's authoritative answer,
    /// newest first. Selection is clamped and a staged delete for a
    /// vanished snippet is dropped.
    pub fn set_snippets(&mut self, mut snippets: Vec<Snippet>) {
        snippets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        self.snippets = snippets;
        let visible = self.filtered().len();
        self.selected = self.selected.min(visible.saturating_sub(1));
        if let Some(id) = &self.pending_delete {
            if !self.snippets.iter().any(|s| &s.id == id) {
                self.pending_delete = None;
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.snippets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.snippets.len()
    }

    pub fn get(&self, id: &str) -> Option<&Snippet> {
        self.snippets.iter().find(|s| s.id == id)
    }

    /// Snippets passing the current search/type/category predicates.
    pub fn filtered(&self) -> Vec<&Snippet> {
        let needle = self.search.to_lowercase();
        self.snippets
            .iter()
            .filter(|s| {
                let matches_search = needle.is_empty()
                    || s.title.to_lowercase().contains(&needle)
                    || s.description.to_lowercase().contains(&needle);
                let matches_category = self
                    .category
                    .as_ref()
                    .map(|c| &s.category == c)
                    .unwrap_or(true);
                matches_search && self.type_filter.matches(s) && matches_category
            })
            .collect()
    }

    /// Categories available under the current type filter, sorted, no
    /// duplicates. Favorites and All expose every category.
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = self
            .snippets
            .iter()
            .filter(|s| match self.type_filter {
                TypeFilter::Kind(kind) => s.snippet_type == kind,
                _ => true,
            })
            .map(|s| s.category.clone())
            .filter(|c| !c.is_empty())
            .collect();
        categories.sort();
        categories.dedup();
        categories
    }

    /// Rotate the category filter through None → each category → None.
    pub fn cycle_category(&mut self) {
        let categories = self.categories();
        self.category = match &self.category {
            None => categories.first().cloned(),
            Some(current) => categories
                .iter()
                .position(|c| c == current)
                .and_then(|i| categories.get(i + 1))
                .cloned(),
        };
        self.clamp_selection();
    }

    pub fn set_type_filter(&mut self, filter: TypeFilter) {
        self.type_filter = filter;
        // Category chips belong to the type slice; reset like the original.
        self.category = None;
        self.clamp_selection();
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected_snippet(&self) -> Option<&Snippet> {
        self.filtered().get(self.selected).copied()
    }

    pub fn select_next(&mut self) {
        let visible = self.filtered().len();
        if visible > 0 {
            self.selected = (self.selected + 1).min(visible - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    fn clamp_selection(&mut self) {
        let visible = self.filtered().len();
        self.selected = self.selected.min(visible.saturating_sub(1));
    }

    // --- delete staging ---

    pub fn begin_delete(&mut self, id: SnippetId) {
        self.pending_delete = Some(id);
    }

    pub fn pending_delete(&self) -> Option<&SnippetId> {
        self.pending_delete.as_ref()
    }

    pub fn take_pending_delete(&mut self) -> Option<SnippetId> {
        self.pending_delete.take()
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snippet(id: &str, title: &str, kind: SnippetType, category: &str, favorite: bool) -> Snippet {
        Snippet {
            id: id.to_string(),
            title: title.to_string(),
            description: format!("{title} description"),
            code: "<b>x</b>".to_string(),
            snippet_type: kind,
            category: category.to_string(),
            instruction: String::new(),
            image_url: None,
            demo_url: None,
            download_url: None,
            created_at: id.len() as i64,
            is_favorite: favorite,
        }
    }

    fn sample_view() -> CollectionView {
        let mut view = CollectionView::new();
        view.set_snippets(vec![
            snippet("a", "Button", SnippetType::Component, "Buttons", false),
            snippet("bb", "Navbar", SnippetType::Component, "Navigation", true),
            snippet("ccc", "Landing", SnippetType::Website, "Pages", false),
            snippet("dddd", "Portfolio", SnippetType::Template, "Pages", true),
        ]);
        view
    }

    #[test]
    fn search_matches_title_and_description() {
        let mut view = sample_view();
        view.search = "navbar".to_string();
        let filtered = view.filtered();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "bb");

        view.search = "DESCRIPTION".to_string();
        assert_eq!(view.filtered().len(), 4);
    }

    #[test]
    fn type_filter_and_favorites() {
        let mut view = sample_view();
        view.set_type_filter(TypeFilter::Kind(SnippetType::Component));
        assert_eq!(view.filtered().len(), 2);

        view.set_type_filter(TypeFilter::Favorites);
        let favorites: Vec<_> = view.filtered().iter().map(|s| s.id.clone()).collect();
        assert_eq!(favorites, vec!["dddd", "bb"]);
    }

    #[test]
    fn categories_follow_type_slice() {
        let mut view = sample_view();
        assert_eq!(view.categories(), vec!["Buttons", "Navigation", "Pages"]);

        view.set_type_filter(TypeFilter::Kind(SnippetType::Website));
        assert_eq!(view.categories(), vec!["Pages"]);
    }

    #[test]
    fn changing_type_filter_resets_category() {
        let mut view = sample_view();
        view.category = Some("Buttons".to_string());
        view.set_type_filter(TypeFilter::Kind(SnippetType::Website));
        assert!(view.category.is_none());
    }

    #[test]
    fn newest_first_ordering() {
        let view = sample_view();
        let ids: Vec<_> = view.filtered().iter().map(|s| s.id.clone()).collect();
        assert_eq!(ids, vec!["dddd", "ccc", "bb", "a"]);
    }

    #[test]
    fn selection_clamps_when_collection_shrinks() {
        let mut view = sample_view();
        view.select_next();
        view.select_next();
        view.select_next();
        assert_eq!(view.selected_index(), 3);

        view.set_snippets(vec![snippet("a", "Button", SnippetType::Component, "Buttons", false)]);
        assert_eq!(view.selected_index(), 0);
        assert_eq!(view.selected_snippet().unwrap().id, "a");
    }

    #[test]
    fn vanished_pending_delete_is_dropped() {
        let mut view = sample_view();
        view.begin_delete("a".to_string());
        view.set_snippets(vec![snippet("bb", "Navbar", SnippetType::Component, "Navigation", true)]);
        assert!(view.pending_delete().is_none());
    }

    #[test]
    fn cycle_category_walks_and_wraps() {
        let mut view = sample_view();
        view.cycle_category();
        assert_eq!(view.category.as_deref(), Some("Buttons"));
        view.cycle_category();
        assert_eq!(view.category.as_deref(), Some("Navigation"));
        view.cycle_category();
        assert_eq!(view.category.as_deref(), Some("Pages"));
        view.cycle_category();
        assert!(view.category.is_none());
    }
}
