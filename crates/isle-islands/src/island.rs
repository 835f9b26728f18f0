//! Per-island activation.
//!
//! An island renders an empty container until it activates. Activation is
//! triggered by the container approaching the viewport (within the lead
//! margin) or by the pointer entering or touching it, whichever comes first.
//! It happens at most once:
//!
//! ```text
//! Unobserved -> Observing -> Triggered -> Activating -> Active
//!                    \___ hover/touch ____/
//! ```
//!
//! Phases only move forward. An island rests in `Triggered` while its
//! activation waits for an idle period (or a zero-delay timer); it moves to
//! `Activating` when that callback runs and resolves the module on the
//! local executor.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::sync::Arc;

use futures::task::{LocalSpawn, LocalSpawnExt};
use isle_core::ModuleDef;

use crate::boundary::{island_container, ModuleBoundary};
use crate::deferred::{schedule_deferred, DeferredScheduler};
use crate::error::ActivationError;
use crate::observer::{ElementId, LeadMargin, ObserverHandle, VisibilityObserver};
use crate::registry::{resolve_module, ComponentRegistry, ModuleVariant};

/// Where an island is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IslandPhase {
    /// Created, not yet watching the viewport.
    Unobserved,
    /// Waiting for visibility or interaction.
    Observing,
    /// Became visible; activation queued for idle time.
    Triggered,
    /// Deferred callback ran; module resolving.
    Activating,
    /// Activation finished, successfully or with a contained error.
    Active,
}

impl IslandPhase {
    /// Name used in markup.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unobserved => "unobserved",
            Self::Observing => "observing",
            Self::Triggered => "triggered",
            Self::Activating => "activating",
            Self::Active => "active",
        }
    }
}

/// What caused activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationTrigger {
    Visible,
    Hover,
    Touch,
}

/// What an island currently shows inside its container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IslandView {
    /// Nothing yet.
    Placeholder,
    /// The module's fallback while a suspending module renders.
    Suspended(String),
    /// The module's markup.
    Interactive(String),
    /// An inline error block.
    Failed(String),
}

impl IslandView {
    fn markup(&self) -> &str {
        match self {
            Self::Placeholder => "",
            Self::Suspended(html) | Self::Interactive(html) | Self::Failed(html) => html,
        }
    }
}

/// Platform capabilities an island runs on.
#[derive(Clone)]
pub struct IslandHost {
    pub observer: Rc<dyn VisibilityObserver>,
    pub scheduler: Rc<dyn DeferredScheduler>,
    pub registry: Arc<dyn ComponentRegistry>,
    pub spawner: Rc<dyn LocalSpawn>,
}

struct IslandInner {
    module: ModuleDef,
    element: ElementId,
    margin: LeadMargin,
    host: IslandHost,
    phase: Cell<IslandPhase>,
    requested: Cell<bool>,
    trigger: Cell<Option<ActivationTrigger>>,
    observer: RefCell<Option<ObserverHandle>>,
    view: RefCell<IslandView>,
    error: RefCell<Option<ActivationError>>,
}

impl IslandInner {
    fn advance(&self, next: IslandPhase) {
        if next > self.phase.get() {
            self.phase.set(next);
        }
    }

    fn disconnect(&self) {
        if let Some(handle) = self.observer.borrow_mut().take() {
            handle.disconnect();
        }
    }

    fn on_visibility(self: &Rc<Self>, is_intersecting: bool) {
        if !is_intersecting || self.phase.get() != IslandPhase::Observing {
            return;
        }
        self.advance(IslandPhase::Triggered);
        self.request_activation(ActivationTrigger::Visible);
    }

    fn request_activation(self: &Rc<Self>, trigger: ActivationTrigger) {
        if self.requested.replace(true) {
            return;
        }
        self.trigger.set(Some(trigger));
        self.disconnect();

        tracing::debug!(
            module = %self.module.module_type,
            key = %self.module.key,
            ?trigger,
            "island activation requested"
        );

        let weak = Rc::downgrade(self);
        schedule_deferred(
            &*self.host.scheduler,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.activate();
                }
            }),
        );
    }

    fn activate(self: &Rc<Self>) {
        self.advance(IslandPhase::Activating);
        let task = run_activation(
            Rc::downgrade(self),
            Arc::clone(&self.host.registry),
            self.module.clone(),
        );
        if let Err(error) = self.host.spawner.spawn_local(task) {
            self.finish(Err(ActivationError::Schedule {
                module: self.module.module_type.clone(),
                reason: error.to_string(),
            }));
        }
    }

    fn finish(&self, result: Result<String, ActivationError>) {
        let view = match result {
            Ok(html) => {
                tracing::debug!(module = %self.module.module_type, key = %self.module.key, "island active");
                IslandView::Interactive(html)
            }
            Err(error) => {
                let html = ModuleBoundary::contain(&self.module, &error);
                *self.error.borrow_mut() = Some(error);
                IslandView::Failed(html)
            }
        };
        *self.view.borrow_mut() = view;
        self.advance(IslandPhase::Active);
    }
}

async fn run_activation(
    island: Weak<IslandInner>,
    registry: Arc<dyn ComponentRegistry>,
    module: ModuleDef,
) {
    let definition = match resolve_module(&*registry, &module.module_type).await {
        Ok(definition) => definition,
        Err(source) => {
            if let Some(inner) = island.upgrade() {
                inner.finish(Err(ActivationError::Resolve {
                    module: module.module_type.clone(),
                    source,
                }));
            }
            return;
        }
    };

    let rendered = match &definition.component {
        ModuleVariant::Sync(component) | ModuleVariant::ClientOnly(component) => {
            component.render(&module.props)
        }
        ModuleVariant::Async(component) => {
            if let Some(inner) = island.upgrade() {
                *inner.view.borrow_mut() =
                    IslandView::Suspended(definition.render_fallback(&module.props));
            }
            component.render(&module.props).await
        }
    };

    if let Some(inner) = island.upgrade() {
        inner.finish(rendered.map_err(|source| ActivationError::Render {
            module: module.module_type.clone(),
            source,
        }));
    }
}

/// Drives one island from mount to activation.
///
/// Dropping the scheduler (or calling `unmount`) disconnects its observer
/// and abandons any activation still in progress.
pub struct ActivationScheduler {
    inner: Rc<IslandInner>,
}

impl ActivationScheduler {
    /// Create an island for `module` rendered into `element`.
    pub fn new(module: ModuleDef, element: ElementId, margin: LeadMargin, host: IslandHost) -> Self {
        Self {
            inner: Rc::new(IslandInner {
                module,
                element,
                margin,
                host,
                phase: Cell::new(IslandPhase::Unobserved),
                requested: Cell::new(false),
                trigger: Cell::new(None),
                observer: RefCell::new(None),
                view: RefCell::new(IslandView::Placeholder),
                error: RefCell::new(None),
            }),
        }
    }

    /// Start watching the container. Call once the container is in the
    /// document; later calls do nothing.
    pub fn mount(&self) {
        let inner = &self.inner;
        if inner.phase.get() != IslandPhase::Unobserved || inner.requested.get() {
            return;
        }

        let weak = Rc::downgrade(inner);
        let handle = inner.host.observer.observe(
            inner.element.clone(),
            inner.margin,
            Box::new(move |is_intersecting| {
                if let Some(inner) = weak.upgrade() {
                    inner.on_visibility(is_intersecting);
                }
            }),
        );
        *inner.observer.borrow_mut() = Some(handle);
        inner.advance(IslandPhase::Observing);
    }

    /// The pointer entered the container.
    pub fn on_pointer_enter(&self) {
        self.inner.request_activation(ActivationTrigger::Hover);
    }

    /// The container was touched.
    pub fn on_touch_start(&self) {
        self.inner.request_activation(ActivationTrigger::Touch);
    }

    /// Tear down: stop observing and drop pending work.
    pub fn unmount(self) {
        self.inner.disconnect();
    }

    pub fn phase(&self) -> IslandPhase {
        self.inner.phase.get()
    }

    pub fn trigger(&self) -> Option<ActivationTrigger> {
        self.inner.trigger.get()
    }

    pub fn view(&self) -> IslandView {
        self.inner.view.borrow().clone()
    }

    /// The contained activation error, if activation failed.
    pub fn error(&self) -> Option<ActivationError> {
        self.inner.error.borrow().clone()
    }

    pub fn module(&self) -> &ModuleDef {
        &self.inner.module
    }

    /// Check if the container is still being watched.
    pub fn is_observing(&self) -> bool {
        self.inner
            .observer
            .borrow()
            .as_ref()
            .is_some_and(ObserverHandle::is_connected)
    }

    /// Container markup for the current state.
    pub fn render(&self) -> String {
        island_container(
            &self.inner.module,
            self.phase().as_str(),
            self.inner.view.borrow().markup(),
        )
    }
}

impl Drop for ActivationScheduler {
    fn drop(&mut self) {
        self.inner.disconnect();
    }
}

impl std::fmt::Debug for ActivationScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivationScheduler")
            .field("module", &self.inner.module.module_type)
            .field("key", &self.inner.module.key)
            .field("phase", &self.phase())
            .finish()
    }
}
