//! Visibility observation.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

/// Identifies the container element of a module instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementId(String);

impl ElementId {
    /// Create an element id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Distance outside the viewport at which an element already counts as visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LeadMargin(u32);

impl LeadMargin {
    /// A margin in CSS pixels, applied on every side of the viewport.
    pub fn px(px: u32) -> Self {
        Self(px)
    }

    /// The margin in pixels.
    pub fn as_px(&self) -> u32 {
        self.0
    }
}

/// Axis-aligned rectangle in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Create a rectangle.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Grow the rectangle by `margin` on every side.
    pub fn expand(&self, margin: LeadMargin) -> Self {
        let m = f64::from(margin.as_px());
        Self {
            x: self.x - m,
            y: self.y - m,
            width: self.width + 2.0 * m,
            height: self.height + 2.0 * m,
        }
    }

    /// Check for an overlap of positive area. Touching edges do not count.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

/// Connection to an observer registration.
///
/// Disconnecting is idempotent; dropping the handle disconnects.
#[derive(Debug)]
pub struct ObserverHandle {
    connected: Rc<Cell<bool>>,
}

impl ObserverHandle {
    /// Create a handle over a shared connection flag.
    pub fn new(connected: Rc<Cell<bool>>) -> Self {
        Self { connected }
    }

    /// Stop delivering callbacks.
    pub fn disconnect(&self) {
        self.connected.set(false);
    }

    /// Check if callbacks are still delivered.
    pub fn is_connected(&self) -> bool {
        self.connected.get()
    }
}

impl Drop for ObserverHandle {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Callback receiving the "is intersecting" flag of a watched element.
pub type VisibilityCallback = Box<dyn FnMut(bool)>;

/// Watches elements for intersection with the (margin-expanded) viewport.
pub trait VisibilityObserver {
    /// Start watching `element`; `callback` fires whenever its
    /// intersection state is reported.
    fn observe(
        &self,
        element: ElementId,
        margin: LeadMargin,
        callback: VisibilityCallback,
    ) -> ObserverHandle;
}

struct Registration {
    element: ElementId,
    margin: LeadMargin,
    callback: Rc<RefCell<VisibilityCallback>>,
    connected: Rc<Cell<bool>>,
    last: Cell<Option<bool>>,
}

/// Geometry-driven observer over laid-out element rectangles.
///
/// Reports are delivered from `flush` (and `scroll_to`), never from inside
/// `observe`, and only when an element's intersection state changes. The
/// first report after `observe` is always delivered once the element has a
/// rectangle.
pub struct ViewportObserver {
    viewport: Cell<Rect>,
    elements: RefCell<HashMap<ElementId, Rect>>,
    registrations: RefCell<Vec<Registration>>,
}

impl ViewportObserver {
    /// Create an observer for a viewport of the given size at scroll offset 0.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            viewport: Cell::new(Rect::new(0.0, 0.0, width, height)),
            elements: RefCell::new(HashMap::new()),
            registrations: RefCell::new(Vec::new()),
        }
    }

    /// Record where an element is laid out.
    pub fn place(&self, element: ElementId, rect: Rect) {
        self.elements.borrow_mut().insert(element, rect);
    }

    /// Scroll vertically to `y` and deliver any resulting reports.
    pub fn scroll_to(&self, y: f64) {
        let mut viewport = self.viewport.get();
        viewport.y = y;
        self.viewport.set(viewport);
        self.flush();
    }

    /// Current viewport rectangle.
    pub fn viewport(&self) -> Rect {
        self.viewport.get()
    }

    /// Number of live registrations.
    pub fn observed(&self) -> usize {
        self.registrations
            .borrow()
            .iter()
            .filter(|r| r.connected.get())
            .count()
    }

    /// Deliver pending intersection reports.
    pub fn flush(&self) {
        let deliveries: Vec<_> = {
            let mut registrations = self.registrations.borrow_mut();
            registrations.retain(|r| r.connected.get());

            let viewport = self.viewport.get();
            let elements = self.elements.borrow();

            registrations
                .iter()
                .filter_map(|r| {
                    let rect = elements.get(&r.element)?;
                    let hit = rect.intersects(&viewport.expand(r.margin));
                    if r.last.replace(Some(hit)) == Some(hit) {
                        return None;
                    }
                    Some((Rc::clone(&r.callback), Rc::clone(&r.connected), hit))
                })
                .collect()
        };

        // Callbacks may disconnect themselves or others while we iterate.
        for (callback, connected, hit) in deliveries {
            if connected.get() {
                (callback.borrow_mut())(hit);
            }
        }
    }
}

impl VisibilityObserver for ViewportObserver {
    fn observe(
        &self,
        element: ElementId,
        margin: LeadMargin,
        callback: VisibilityCallback,
    ) -> ObserverHandle {
        let connected = Rc::new(Cell::new(true));
        self.registrations.borrow_mut().push(Registration {
            element,
            margin,
            callback: Rc::new(RefCell::new(callback)),
            connected: Rc::clone(&connected),
            last: Cell::new(None),
        });
        ObserverHandle::new(connected)
    }
}
