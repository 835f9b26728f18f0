//! Per-module render decisions.

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use isle_core::{IslandConfig, ModuleDef};

use crate::boundary::{island_container, ModuleBoundary};
use crate::island::IslandPhase;
use crate::registry::{ComponentRegistry, ModuleVariant};

/// Where rendering happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderSide {
    Server,
    Client,
}

/// Outcome of rendering one module.
pub enum RenderedModule {
    /// Markup is final.
    Ready { key: String, html: String },
    /// The fallback shows until `pending` resolves.
    Suspended {
        key: String,
        fallback: String,
        pending: BoxFuture<'static, String>,
    },
    /// Deferred until activation. The module has not been resolved.
    Island { module: ModuleDef },
}

impl RenderedModule {
    /// Instance key.
    pub fn key(&self) -> &str {
        match self {
            Self::Ready { key, .. } | Self::Suspended { key, .. } => key,
            Self::Island { module } => &module.key,
        }
    }

    /// Check if this module waits for activation.
    pub fn is_island(&self) -> bool {
        matches!(self, Self::Island { .. })
    }

    /// Resolve to final markup, awaiting suspended modules.
    ///
    /// Islands become the empty container a fresh `ActivationScheduler`
    /// renders, so server and client markup match before activation.
    pub async fn into_html(self) -> String {
        match self {
            Self::Ready { html, .. } => html,
            Self::Suspended { pending, .. } => pending.await,
            Self::Island { module } => {
                island_container(&module, IslandPhase::Unobserved.as_str(), "")
            }
        }
    }
}

impl std::fmt::Debug for RenderedModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready { key, html } => f
                .debug_struct("Ready")
                .field("key", key)
                .field("html", html)
                .finish(),
            Self::Suspended { key, fallback, .. } => f
                .debug_struct("Suspended")
                .field("key", key)
                .field("fallback", fallback)
                .finish_non_exhaustive(),
            Self::Island { module } => f.debug_struct("Island").field("module", module).finish(),
        }
    }
}

/// Renders module lists, deciding which modules become islands.
pub struct ModuleRenderer {
    registry: Arc<dyn ComponentRegistry>,
    config: IslandConfig,
    side: RenderSide,
}

impl ModuleRenderer {
    /// Create a renderer.
    pub fn new(registry: Arc<dyn ComponentRegistry>, config: IslandConfig, side: RenderSide) -> Self {
        Self {
            registry,
            config,
            side,
        }
    }

    /// Render the module at position `index` of its page.
    ///
    /// Lazy modules are not resolved here. Everything else resolves
    /// through the registry and any failure renders in place.
    pub fn render(&self, module: &ModuleDef, index: usize) -> RenderedModule {
        if self.config.is_lazy(&module.module_type, index) {
            return RenderedModule::Island {
                module: module.clone(),
            };
        }

        let key = module.key.clone();
        let definition = match self.registry.load_module(&module.module_type) {
            Ok(definition) => definition,
            Err(error) => {
                return RenderedModule::Ready {
                    key,
                    html: ModuleBoundary::contain(module, &error),
                }
            }
        };

        let component = match (&definition.component, self.side) {
            (ModuleVariant::ClientOnly(_), RenderSide::Server) => {
                return RenderedModule::Ready {
                    key,
                    html: definition.render_fallback(&module.props),
                }
            }
            (ModuleVariant::Sync(c) | ModuleVariant::ClientOnly(c), _) => c,
            (ModuleVariant::Async(component), _) => {
                let component = Arc::clone(component);
                let owned = module.clone();
                let pending = async move {
                    match component.render(&owned.props).await {
                        Ok(html) => html,
                        Err(error) => ModuleBoundary::contain(&owned, &error),
                    }
                }
                .boxed();
                return RenderedModule::Suspended {
                    key,
                    fallback: definition.render_fallback(&module.props),
                    pending,
                };
            }
        };

        let html = component
            .render(&module.props)
            .unwrap_or_else(|error| ModuleBoundary::contain(module, &error));
        RenderedModule::Ready { key, html }
    }

    /// Render a page's modules in order.
    pub fn render_all(&self, modules: &[ModuleDef]) -> Vec<RenderedModule> {
        modules
            .iter()
            .enumerate()
            .map(|(index, module)| self.render(module, index))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use futures::executor::block_on;
    use isle_core::Props;
    use serde_json::json;

    use super::*;
    use crate::error::RenderError;
    use crate::registry::{render_fn, AsyncComponent, ModuleDefinition, StaticRegistry};

    struct Reviews;

    #[async_trait]
    impl AsyncComponent for Reviews {
        async fn render(&self, props: &Props) -> Result<String, RenderError> {
            Ok(format!("<p>{} reviews</p>", props["count"]))
        }
    }

    fn registry() -> Arc<dyn ComponentRegistry> {
        Arc::new(
            StaticRegistry::new()
                .register("Hero", ModuleDefinition::sync(render_fn(|_| Ok("<h1></h1>".to_string()))))
                .register(
                    "Broken",
                    ModuleDefinition::sync(render_fn(|_| Err(RenderError::Failed("boom".into())))),
                )
                .register(
                    "Reviews",
                    ModuleDefinition::suspending(Reviews)
                        .with_fallback(render_fn(|_| Ok("loading".to_string()))),
                )
                .register(
                    "Cart",
                    ModuleDefinition::client_only(render_fn(|_| Ok("<cart/>".to_string())))
                        .with_fallback(render_fn(|_| Ok("<cart-skeleton/>".to_string()))),
                ),
        )
    }

    fn renderer(side: RenderSide) -> ModuleRenderer {
        ModuleRenderer::new(registry(), IslandConfig::default(), side)
    }

    #[test]
    fn test_sync_module_renders() {
        let rendered = renderer(RenderSide::Server).render(&ModuleDef::new("Hero", "h"), 0);
        assert!(matches!(rendered, RenderedModule::Ready { ref html, .. } if html == "<h1></h1>"));
    }

    #[test]
    fn test_failure_is_contained() {
        let rendered = renderer(RenderSide::Server).render(&ModuleDef::new("Broken", "b"), 0);
        let html = block_on(rendered.into_html());

        assert!(html.contains("Error in Broken"));
        assert!(html.contains("boom"));
    }

    #[test]
    fn test_unknown_module_is_contained() {
        let rendered = renderer(RenderSide::Server).render(&ModuleDef::new("Ghost", "g"), 0);
        let html = block_on(rendered.into_html());

        assert!(html.contains("Unknown module type: Ghost"));
    }

    #[test]
    fn test_async_module_suspends_with_fallback() {
        let module = ModuleDef::new("Reviews", "r").with_props(json!({"count": 4}));
        let rendered = renderer(RenderSide::Client).render(&module, 0);

        match rendered {
            RenderedModule::Suspended { fallback, pending, .. } => {
                assert_eq!(fallback, "loading");
                assert_eq!(block_on(pending), "<p>4 reviews</p>");
            }
            other => panic!("expected suspended, got {other:?}"),
        }
    }

    #[test]
    fn test_client_only_renders_fallback_on_server() {
        let module = ModuleDef::new("Cart", "c");

        let server = block_on(renderer(RenderSide::Server).render(&module, 0).into_html());
        let client = block_on(renderer(RenderSide::Client).render(&module, 0).into_html());

        assert_eq!(server, "<cart-skeleton/>");
        assert_eq!(client, "<cart/>");
    }

    #[test]
    fn test_lazy_types_become_islands() {
        let rendered = renderer(RenderSide::Client).render(&ModuleDef::new("Gallery", "g"), 0);
        assert!(rendered.is_island());
    }

    #[test]
    fn test_modules_past_eager_count_become_islands() {
        let modules: Vec<_> = (0..5).map(|i| ModuleDef::new("Hero", format!("h{i}"))).collect();

        let rendered = renderer(RenderSide::Client).render_all(&modules);
        let islands: Vec<bool> = rendered.iter().map(RenderedModule::is_island).collect();

        assert_eq!(islands, vec![false, false, false, true, true]);
        assert_eq!(rendered[4].key(), "h4");
    }

    #[test]
    fn test_island_html_is_empty_container() {
        let rendered = renderer(RenderSide::Server).render(&ModuleDef::new("Map", "m"), 0);
        let html = block_on(rendered.into_html());

        assert_eq!(html, r#"<div data-island="Map" data-key="m" data-state="unobserved"></div>"#);
    }
}
