//! Module type registry.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use isle_core::Props;

use crate::boundary::html_escape;
use crate::error::{RegistryError, RenderError};

/// A component that renders synchronously.
pub trait Component: Send + Sync {
    /// Render `props` to markup.
    fn render(&self, props: &Props) -> Result<String, RenderError>;
}

impl<F> Component for F
where
    F: Fn(&Props) -> Result<String, RenderError> + Send + Sync,
{
    fn render(&self, props: &Props) -> Result<String, RenderError> {
        self(props)
    }
}

/// Wrap a closure as a component.
pub fn render_fn<F>(f: F) -> impl Component
where
    F: Fn(&Props) -> Result<String, RenderError> + Send + Sync + 'static,
{
    f
}

/// A component that suspends while it renders.
#[async_trait]
pub trait AsyncComponent: Send + Sync {
    /// Render `props` to markup.
    async fn render(&self, props: &Props) -> Result<String, RenderError>;
}

/// How a module renders.
#[derive(Clone)]
pub enum ModuleVariant {
    /// Renders immediately, on server and client.
    Sync(Arc<dyn Component>),
    /// Suspends; its fallback shows until it resolves.
    Async(Arc<dyn AsyncComponent>),
    /// Renders on the client only. Servers emit the fallback instead.
    ClientOnly(Arc<dyn Component>),
}

impl std::fmt::Debug for ModuleVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Sync(_) => "Sync",
            Self::Async(_) => "Async",
            Self::ClientOnly(_) => "ClientOnly",
        };
        f.write_str(name)
    }
}

/// A resolved module: its component and optional fallback.
#[derive(Clone)]
pub struct ModuleDefinition {
    pub component: ModuleVariant,
    pub fallback: Option<Arc<dyn Component>>,
}

impl ModuleDefinition {
    /// A synchronous module.
    pub fn sync(component: impl Component + 'static) -> Self {
        Self::new(ModuleVariant::Sync(Arc::new(component)))
    }

    /// A suspending module.
    pub fn suspending(component: impl AsyncComponent + 'static) -> Self {
        Self::new(ModuleVariant::Async(Arc::new(component)))
    }

    /// A client-only module.
    pub fn client_only(component: impl Component + 'static) -> Self {
        Self::new(ModuleVariant::ClientOnly(Arc::new(component)))
    }

    fn new(component: ModuleVariant) -> Self {
        Self {
            component,
            fallback: None,
        }
    }

    /// Set the fallback component.
    pub fn with_fallback(mut self, fallback: impl Component + 'static) -> Self {
        self.fallback = Some(Arc::new(fallback));
        self
    }

    /// Render the fallback, or nothing when there is none.
    ///
    /// A failing fallback renders as nothing.
    pub fn render_fallback(&self, props: &Props) -> String {
        self.fallback
            .as_ref()
            .and_then(|f| f.render(props).ok())
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for ModuleDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleDefinition")
            .field("component", &self.component)
            .field("has_fallback", &self.fallback.is_some())
            .finish()
    }
}

/// Maps module type tags to definitions.
#[async_trait]
pub trait ComponentRegistry: Send + Sync {
    /// Resolve a module without suspending.
    fn load_module(&self, module_type: &str) -> Result<ModuleDefinition, RegistryError>;

    /// Make `load_module` succeed for `module_type` without suspending.
    async fn preload_module(&self, module_type: &str) -> Result<(), RegistryError>;
}

/// Resolve a module, preloading it first when it has not been yet.
pub async fn resolve_module(
    registry: &dyn ComponentRegistry,
    module_type: &str,
) -> Result<ModuleDefinition, RegistryError> {
    match registry.load_module(module_type) {
        Err(RegistryError::NotPreloaded(_)) => {
            registry.preload_module(module_type).await?;
            registry.load_module(module_type)
        }
        other => other,
    }
}

/// Loads a module definition on demand.
#[async_trait]
pub trait ModuleLoader: Send + Sync {
    async fn load(&self) -> Result<ModuleDefinition, RegistryError>;
}

/// Registry over a fixed set of modules.
///
/// Modules registered with `register` resolve immediately. Modules
/// registered with `register_lazy` resolve only after `preload_module`;
/// a failed preload leaves an inline error component in their place so
/// rendering never suspends on resolution.
#[derive(Default)]
pub struct StaticRegistry {
    loaders: HashMap<String, Arc<dyn ModuleLoader>>,
    resolved: RwLock<HashMap<String, ModuleDefinition>>,
}

impl StaticRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module that resolves immediately.
    pub fn register(self, module_type: impl Into<String>, definition: ModuleDefinition) -> Self {
        self.resolved
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(module_type.into(), definition);
        self
    }

    /// Register a module behind a loader.
    pub fn register_lazy(
        mut self,
        module_type: impl Into<String>,
        loader: impl ModuleLoader + 'static,
    ) -> Self {
        self.loaders.insert(module_type.into(), Arc::new(loader));
        self
    }

    /// Check if `module_type` resolves without suspending.
    pub fn is_resolved(&self, module_type: &str) -> bool {
        self.resolved
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(module_type)
    }

    /// Registered module types, resolved or not.
    pub fn module_types(&self) -> Vec<String> {
        let resolved = self.resolved.read().unwrap_or_else(PoisonError::into_inner);
        let mut types: Vec<String> = resolved
            .keys()
            .chain(self.loaders.keys().filter(|k| !resolved.contains_key(*k)))
            .cloned()
            .collect();
        types.sort();
        types
    }

    fn store(&self, module_type: &str, definition: ModuleDefinition) {
        self.resolved
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(module_type.to_string(), definition);
    }
}

#[async_trait]
impl ComponentRegistry for StaticRegistry {
    fn load_module(&self, module_type: &str) -> Result<ModuleDefinition, RegistryError> {
        if let Some(definition) = self
            .resolved
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(module_type)
        {
            return Ok(definition.clone());
        }

        if self.loaders.contains_key(module_type) {
            Err(RegistryError::NotPreloaded(module_type.to_string()))
        } else {
            Err(RegistryError::UnknownModule(module_type.to_string()))
        }
    }

    async fn preload_module(&self, module_type: &str) -> Result<(), RegistryError> {
        if self.is_resolved(module_type) {
            return Ok(());
        }

        let result = match self.loaders.get(module_type) {
            Some(loader) => loader.load().await,
            None => Err(RegistryError::UnknownModule(module_type.to_string())),
        };

        match result {
            Ok(definition) => {
                tracing::debug!(module = module_type, "module preloaded");
                self.store(module_type, definition);
                Ok(())
            }
            Err(error) => {
                tracing::warn!(module = module_type, %error, "module preload failed");
                self.store(module_type, load_error_module(module_type));
                Err(error)
            }
        }
    }
}

/// Stand-in for a module that failed to load.
fn load_error_module(module_type: &str) -> ModuleDefinition {
    let message = format!(
        r#"<div class="module-error">Error loading {}</div>"#,
        html_escape(module_type)
    );
    ModuleDefinition::sync(render_fn(move |_| Ok(message.clone())))
}
