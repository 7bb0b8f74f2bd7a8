//! Page model the tracker observes
//!
//! The tracker never touches a real browser. It reads a page through the
//! [`PageView`] trait: document-ordered elements, their attributes, their
//! viewport-relative boxes, and a few document properties. [`DomSnapshot`]
//! is the in-memory implementation used by scenario replay and tests.
//!
//! # Modules
//!
//! - [`selector`]: the small selector language used for slide detection
//! - [`dom`]: arena-backed DOM snapshot with the mutations a quiz performs
//! - [`scenario`]: recorded page plus user steps, loaded from YAML or JSON

pub mod dom;
pub mod scenario;
pub mod selector;

pub use dom::{DomSnapshot, ElementSpec};
pub use scenario::{Scenario, Step};
pub use selector::Selector;

use serde::{Deserialize, Serialize};

/// Stable handle of an element inside one page
///
/// Handles are compared by identity: two handles are the same slide only if
/// they point at the same element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub usize);

/// Axis-aligned box of an element
///
/// Inside a [`ElementSpec`] the box is in document coordinates; the value
/// returned by [`PageView::bounding_rect`] is relative to the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Distance from the top edge
    #[serde(default)]
    pub top: f64,
    /// Rendered height in px
    #[serde(default)]
    pub height: f64,
    /// Rendered width in px
    #[serde(default)]
    pub width: f64,
}

impl Rect {
    /// Create a rect from its top edge and size
    pub fn new(top: f64, width: f64, height: f64) -> Self {
        Self { top, height, width }
    }

    /// Bottom edge
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Read-only view of a page
///
/// Implementations must report elements in document order and keep
/// [`ElementId`]s stable for the lifetime of the page.
pub trait PageView {
    /// Full URL of the page
    fn href(&self) -> &str;

    /// Path component of the page URL
    fn path(&self) -> &str;

    /// Browser user agent string
    fn user_agent(&self) -> &str;

    /// Height of the viewport in px
    fn viewport_height(&self) -> f64;

    /// All elements in document order
    fn elements(&self) -> Vec<ElementId>;

    /// Attribute value of an element, `id` and `class` included
    fn attribute(&self, element: ElementId, name: &str) -> Option<&str>;

    /// Lowercase tag name of an element
    fn tag(&self, element: ElementId) -> Option<&str>;

    /// Parent element, `None` for roots
    fn parent(&self, element: ElementId) -> Option<ElementId>;

    /// Viewport-relative box; all zeros when the element is not rendered
    fn bounding_rect(&self, element: ElementId) -> Rect;

    /// Whether computed style leaves the element displayed and visible
    fn is_rendered(&self, element: ElementId) -> bool;

    /// Trimmed text of the first `h1`..`h6` descendant
    fn first_heading_text(&self, element: ElementId) -> Option<String>;

    /// All elements matching `selector`, in document order
    fn query_all(&self, selector: &Selector) -> Vec<ElementId> {
        self.elements()
            .into_iter()
            .filter(|el| selector.matches(self, *el))
            .collect()
    }

    /// First element matching `selector`
    fn query(&self, selector: &Selector) -> Option<ElementId> {
        self.elements()
            .into_iter()
            .find(|el| selector.matches(self, *el))
    }

    /// Whether `element` or one of its ancestors matches `selector`
    fn closest(&self, element: ElementId, selector: &Selector) -> Option<ElementId> {
        let mut current = Some(element);
        while let Some(el) = current {
            if selector.matches(self, el) {
                return Some(el);
            }
            current = self.parent(el);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_bottom() {
        let rect = Rect::new(50.0, 300.0, 200.0);
        assert_eq!(rect.bottom(), 250.0);
    }

    #[test]
    fn test_rect_default_is_empty() {
        let rect = Rect::default();
        assert_eq!(rect.height, 0.0);
        assert_eq!(rect.width, 0.0);
    }
}
