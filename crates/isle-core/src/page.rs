//! Page and module definitions returned by the content backend.

use serde::{Deserialize, Serialize};

/// Props passed to a module, as sent by the content backend.
pub type Props = serde_json::Value;

/// One module instance in a page's module tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleDef {
    /// Module type tag resolved through the component registry.
    #[serde(rename = "type")]
    pub module_type: String,
    /// Stable key of this instance within the page.
    pub key: String,
    /// Props for the module.
    #[serde(default)]
    pub props: Props,
}

impl ModuleDef {
    /// Create a module definition with empty props.
    pub fn new(module_type: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            module_type: module_type.into(),
            key: key.into(),
            props: Props::Null,
        }
    }

    /// Set the props.
    pub fn with_props(mut self, props: Props) -> Self {
        self.props = props;
        self
    }
}

/// How the backend expects a page to be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    #[default]
    Static,
    Dynamic,
}

/// Search engine metadata for a page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Seo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
}

/// A resolved page: its module tree plus metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageData {
    #[serde(default)]
    pub render_mode: RenderMode,
    /// Cache lifetime hint in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
    pub modules: Vec<ModuleDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo: Option<Seo>,
}

impl PageData {
    /// Distinct module types in first-appearance order.
    pub fn module_types(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for module in &self.modules {
            if !seen.contains(&module.module_type.as_str()) {
                seen.push(module.module_type.as_str());
            }
        }
        seen
    }
}
