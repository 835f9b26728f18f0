//! Server-rendered document shell.

use std::sync::Arc;

use futures::future::join_all;
use isle_core::{IslandConfig, ModuleDef, PageData};
use serde::Serialize;

use crate::boundary::html_escape;
use crate::error::RenderError;
use crate::registry::ComponentRegistry;
use crate::renderer::{ModuleRenderer, RenderSide};

const DEFAULT_TITLE: &str = "Untitled";

/// Data embedded in the document for the client runtime.
#[derive(Serialize)]
struct HydrationData<'a> {
    modules: &'a [ModuleDef],
}

/// Render a full HTML document for `page`.
///
/// Every distinct module type is preloaded concurrently first, so module
/// resolution never suspends while the body is assembled. Preload failures
/// are logged and render as inline errors. Lazy modules render as empty
/// island containers; the module list is embedded for the client to pick up.
pub async fn render_document(
    page: &PageData,
    registry: Arc<dyn ComponentRegistry>,
    config: &IslandConfig,
) -> Result<String, RenderError> {
    let types = page.module_types();
    let preloads = join_all(types.iter().map(|t| registry.preload_module(t))).await;
    for (module_type, result) in types.iter().zip(preloads) {
        if let Err(error) = result {
            tracing::warn!(module = %module_type, %error, "preload failed");
        }
    }

    let renderer = ModuleRenderer::new(registry, config.clone(), RenderSide::Server);
    let mut body = String::new();
    for rendered in renderer.render_all(&page.modules) {
        body.push_str(&rendered.into_html().await);
    }

    let data = serde_json::to_string(&HydrationData {
        modules: &page.modules,
    })
    .map_err(|e| RenderError::Failed(format!("Failed to serialize page data: {e}")))?;

    let seo = page.seo.as_ref();
    let title = seo
        .and_then(|s| s.title.as_deref())
        .unwrap_or(DEFAULT_TITLE);
    let description = seo
        .and_then(|s| s.description.as_deref())
        .map(|d| format!(r#"<meta name="description" content="{}">"#, html_escape(d)))
        .unwrap_or_default();

    tracing::debug!(modules = page.modules.len(), "document rendered");

    Ok(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title}</title>
    {description}
</head>
<body>
    <div id="root">{body}</div>
    <script>window.__DATA__ = {data}</script>
</body>
</html>"#,
        title = html_escape(title),
        data = data.replace("</", "<\\/"),
    ))
}
