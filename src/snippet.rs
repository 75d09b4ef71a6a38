//! The snippet data model
//!
//! A `Snippet` is the persisted unit the library manages: a piece of
//! HTML/CSS/JS source plus display metadata. Field names follow the backend
//! columns of the original deployment (`image_url`, `is_favorite`, ...), so a
//! store can round-trip records without a mapping layer.

use serde::{Deserialize, Serialize};

/// Opaque unique identifier, immutable once assigned by a store.
pub type SnippetId = String;

/// What kind of snippet this is. Fixed for the lifetime of a snippet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnippetType {
    Component,
    Website,
    Template,
}

impl SnippetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Component => "component",
            Self::Website => "website",
            Self::Template => "template",
        }
    }

    /// Cycle order used by the add-snippet form.
    pub fn next(self) -> Self {
        match self {
            Self::Component => Self::Website,
            Self::Website => Self::Template,
            Self::Template => Self::Component,
        }
    }
}

impl Default for SnippetType {
    fn default() -> Self {
        Self::Component
    }
}

/// A saved snippet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snippet {
    pub id: SnippetId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub code: String,
    #[serde(rename = "type", default)]
    pub snippet_type: SnippetType,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub instruction: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    /// Creation time in milliseconds since the epoch. Used for sort order
    /// only; not an ordering guarantee across clock skew.
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub is_favorite: bool,
}

fn default_category() -> String {
    "Other".to_string()
}

/// Field set for creating a new snippet. The store assigns `id` and
/// `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSnippet {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub code: String,
    #[serde(rename = "type", default)]
    pub snippet_type: SnippetType,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub instruction: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub demo_url: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
}

impl NewSnippet {
    /// Field set for a save-as copy: working draft code and a candidate
    /// title, everything else carried over from the original. The original
    /// snippet is never mutated by this.
    pub fn copy_of(original: &Snippet, title: String, code: String) -> Self {
        Self {
            title,
            description: original.description.clone(),
            code,
            snippet_type: original.snippet_type,
            category: original.category.clone(),
            instruction: original.instruction.clone(),
            image_url: original.image_url.clone(),
            demo_url: original.demo_url.clone(),
            download_url: original.download_url.clone(),
        }
    }
}

/// Partial update applied by `SnippetStore::update`. Only set fields change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnippetPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl SnippetPatch {
    pub fn code(code: String) -> Self {
        Self {
            code: Some(code),
            ..Self::default()
        }
    }

    pub fn favorite(value: bool) -> Self {
        Self {
            is_favorite: Some(value),
            ..Self::default()
        }
    }

    pub fn apply_to(&self, snippet: &mut Snippet) {
        if let Some(code) = &self.code {
            snippet.code = code.clone();
        }
        if let Some(title) = &self.title {
            snippet.title = title.clone();
        }
        if let Some(description) = &self.description {
            snippet.description = description.clone();
        }
        if let Some(category) = &self.category {
            snippet.category = category.clone();
        }
        if let Some(is_favorite) = self.is_favorite {
            snippet.is_favorite = is_favorite;
        }
        if let Some(image_url) = &self.image_url {
            snippet.image_url = Some(image_url.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Snippet {
        Snippet {
            id: "a1".to_string(),
            title: "Button".to_string(),
            description: "A button".to_string(),
            code: "<button>hi</button>".to_string(),
            snippet_type: SnippetType::Component,
            category: "Buttons".to_string(),
            instruction: String::new(),
            image_url: None,
            demo_url: None,
            download_url: None,
            created_at: 1_700_000_000_000,
            is_favorite: false,
        }
    }

    #[test]
    fn patch_applies_only_set_fields() {
        let mut snippet = sample();
        SnippetPatch::code("<b>new</b>".to_string()).apply_to(&mut snippet);
        assert_eq!(snippet.code, "<b>new</b>");
        assert_eq!(snippet.title, "Button");

        SnippetPatch::favorite(true).apply_to(&mut snippet);
        assert!(snippet.is_favorite);
        assert_eq!(snippet.code, "<b>new</b>");
    }

    #[test]
    fn copy_of_carries_metadata_but_not_identity() {
        let original = sample();
        let copy = NewSnippet::copy_of(&original, "Button (copy)".to_string(), "<i>x</i>".to_string());
        assert_eq!(copy.title, "Button (copy)");
        assert_eq!(copy.code, "<i>x</i>");
        assert_eq!(copy.category, original.category);
        assert_eq!(copy.snippet_type, original.snippet_type);
    }

    #[test]
    fn missing_category_defaults_to_other() {
        let json = r#"{"id":"x","title":"T","type":"website","created_at":1}"#;
        let snippet: Snippet = serde_json::from_str(json).unwrap();
        assert_eq!(snippet.category, "Other");
        assert_eq!(snippet.snippet_type, SnippetType::Website);
        assert!(snippet.code.is_empty());
    }
}
