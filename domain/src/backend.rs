//! Backend identity and panel configuration value objects

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Stable string identifier of a model backend (Value Object)
///
/// Matches the identifier the backend service itself understands,
/// e.g. `"x-ai/grok-4-fast"` for OpenRouter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackendId(String);

impl BackendId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BackendId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BackendId {
    fn from(s: &str) -> Self {
        BackendId::new(s)
    }
}

impl From<String> for BackendId {
    fn from(s: String) -> Self {
        BackendId::new(s)
    }
}

/// Pricing tier of a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Free,
    Premium,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Free => "free",
            Category::Premium => "premium",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Static description of one panel member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendSpec {
    /// Identifier understood by the backend service
    pub id: BackendId,
    /// Human-readable name for display
    pub display_name: String,
    /// Pricing tier
    pub category: Category,
}

impl BackendSpec {
    pub fn new(id: impl Into<BackendId>, display_name: impl Into<String>, category: Category) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            category,
        }
    }
}

/// The fixed, ordered set of backends dispatched to for every request (Value Object)
///
/// Validated at construction: non-empty, unique identifiers. The order of the
/// panel is the order tasks appear in every request and result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<BackendSpec>", into = "Vec<BackendSpec>")]
pub struct PanelConfig {
    backends: Vec<BackendSpec>,
}

impl PanelConfig {
    /// Create a panel, validating that it is non-empty with unique ids
    pub fn new(backends: Vec<BackendSpec>) -> Result<Self, DomainError> {
        if backends.is_empty() {
            return Err(DomainError::EmptyPanel);
        }
        let mut seen = HashSet::new();
        for spec in &backends {
            if !seen.insert(&spec.id) {
                return Err(DomainError::DuplicateBackend(spec.id.to_string()));
            }
        }
        Ok(Self { backends })
    }

    /// The default OpenRouter panel: five free and four premium models
    pub fn default_panel() -> Self {
        let backends = vec![
            BackendSpec::new("minimax/minimax-m2:free", "MiniMax M2", Category::Free),
            BackendSpec::new("meituan/longcat-flash-chat:free", "LongCat Flash", Category::Free),
            BackendSpec::new("openai/gpt-oss-20b:free", "GPT-OSS 20B", Category::Free),
            BackendSpec::new("z-ai/glm-4.5-air:free", "GLM-4.5 Air", Category::Free),
            BackendSpec::new(
                "cognitivecomputations/dolphin-mistral-24b-venice-edition:free",
                "Dolphin Mistral",
                Category::Free,
            ),
            BackendSpec::new("deepseek/deepseek-v3.2-exp", "DeepSeek V3.2", Category::Premium),
            BackendSpec::new("x-ai/grok-4-fast", "Grok-4 Fast", Category::Premium),
            BackendSpec::new("arcee-ai/afm-4.5b", "AFM-4.5B", Category::Premium),
            BackendSpec::new("openai/gpt-oss-120b:exacto", "GPT-OSS 120B", Category::Premium),
        ];
        Self::new(backends).expect("default panel is valid")
    }

    pub fn iter(&self) -> impl Iterator<Item = &BackendSpec> {
        self.backends.iter()
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    pub fn get(&self, id: &BackendId) -> Option<&BackendSpec> {
        self.backends.iter().find(|s| &s.id == id)
    }

    /// Restrict the panel to the given ids, preserving panel order.
    ///
    /// Ids not present in the panel are ignored; an empty intersection is an
    /// [`DomainError::EmptyPanel`] error.
    pub fn subset(&self, ids: &[BackendId]) -> Result<Self, DomainError> {
        let backends: Vec<BackendSpec> = self
            .backends
            .iter()
            .filter(|s| ids.contains(&s.id))
            .cloned()
            .collect();
        Self::new(backends)
    }
}

impl TryFrom<Vec<BackendSpec>> for PanelConfig {
    type Error = DomainError;

    fn try_from(backends: Vec<BackendSpec>) -> Result<Self, Self::Error> {
        PanelConfig::new(backends)
    }
}

impl From<PanelConfig> for Vec<BackendSpec> {
    fn from(panel: PanelConfig) -> Self {
        panel.backends
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(id: &str) -> BackendSpec {
        BackendSpec::new(id, id.to_uppercase(), Category::Free)
    }

    #[test]
    fn test_empty_panel_rejected() {
        assert!(matches!(PanelConfig::new(vec![]), Err(DomainError::EmptyPanel)));
    }

    #[test]
    fn test_duplicate_backend_rejected() {
        let result = PanelConfig::new(vec![spec("a"), spec("b"), spec("a")]);
        assert!(matches!(result, Err(DomainError::DuplicateBackend(id)) if id == "a"));
    }

    #[test]
    fn test_panel_preserves_order() {
        let panel = PanelConfig::new(vec![spec("b"), spec("a"), spec("c")]).unwrap();
        let ids: Vec<&str> = panel.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_default_panel_is_valid() {
        let panel = PanelConfig::default_panel();
        assert_eq!(panel.len(), 9);
        assert_eq!(panel.iter().filter(|s| s.category == Category::Free).count(), 5);
    }

    #[test]
    fn test_subset_preserves_panel_order() {
        let panel = PanelConfig::new(vec![spec("a"), spec("b"), spec("c")]).unwrap();
        let subset = panel
            .subset(&[BackendId::new("c"), BackendId::new("a")])
            .unwrap();
        let ids: Vec<&str> = subset.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_subset_with_no_match_is_empty_panel() {
        let panel = PanelConfig::new(vec![spec("a")]).unwrap();
        assert!(matches!(
            panel.subset(&[BackendId::new("zzz")]),
            Err(DomainError::EmptyPanel)
        ));
    }
}
