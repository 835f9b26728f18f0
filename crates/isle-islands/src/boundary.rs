//! Error containment and module markup.

use isle_core::ModuleDef;

/// Keeps a module's failure inside that module.
///
/// A failing module renders an inline error block in its own slot; the
/// page around it keeps rendering.
pub struct ModuleBoundary;

impl ModuleBoundary {
    /// Log `error` and return the inline error block for `module`.
    pub fn contain(module: &ModuleDef, error: &dyn std::fmt::Display) -> String {
        tracing::error!(
            module = %module.module_type,
            key = %module.key,
            %error,
            "module failed"
        );
        error_block(&module.module_type, &error.to_string())
    }
}

/// Inline error block markup.
pub fn error_block(module_type: &str, message: &str) -> String {
    format!(
        r#"<div class="module-error" data-module="{}"><strong>Error in {}</strong><pre>{}</pre></div>"#,
        html_escape(module_type),
        html_escape(module_type),
        html_escape(message)
    )
}

/// Container for a lazily activated module.
pub fn island_container(module: &ModuleDef, state: &str, inner: &str) -> String {
    format!(
        r#"<div data-island="{}" data-key="{}" data-state="{}">{}</div>"#,
        html_escape(&module.module_type),
        html_escape(&module.key),
        state,
        inner
    )
}

/// Simple HTML escape for text and attribute values.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
