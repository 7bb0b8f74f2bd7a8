//! In-memory DOM snapshot
//!
//! [`DomSnapshot`] stores a page as an arena of nodes in document order.
//! It implements [`PageView`] and offers the handful of mutations a quiz
//! page performs between tracker checks: toggling classes, scrolling, and
//! hiding the document.

use crate::error::{QuizTrackError, Result};
use crate::page::{ElementId, PageView, Rect};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Declarative element description used to build a snapshot
///
/// This is the shape scenario files use for their element tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElementSpec {
    /// Tag name, `div` when omitted
    #[serde(default = "default_tag")]
    pub tag: String,

    /// Value of the `id` attribute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Class list
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,

    /// Other attributes, e.g. `data-slide`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,

    /// Own text content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Computed `display`
    #[serde(default = "default_display")]
    pub display: String,

    /// Computed `visibility`
    #[serde(default = "default_visibility")]
    pub visibility: String,

    /// Box in document coordinates
    #[serde(default)]
    pub rect: Rect,

    /// Child elements
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementSpec>,
}

fn default_tag() -> String {
    "div".to_string()
}

fn default_display() -> String {
    "block".to_string()
}

fn default_visibility() -> String {
    "visible".to_string()
}

impl ElementSpec {
    /// Create an element with the given tag and default style
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            id: None,
            classes: Vec::new(),
            attributes: BTreeMap::new(),
            text: None,
            display: default_display(),
            visibility: default_visibility(),
            rect: Rect::default(),
            children: Vec::new(),
        }
    }

    /// Set the `id` attribute
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    /// Set the class list
    pub fn with_classes(mut self, classes: &[&str]) -> Self {
        self.classes = classes.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Add an attribute
    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    /// Set own text content
    pub fn with_text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    /// Set the document-coordinate box
    pub fn with_rect(mut self, top: f64, width: f64, height: f64) -> Self {
        self.rect = Rect::new(top, width, height);
        self
    }

    /// Set computed `display`
    pub fn with_display(mut self, display: &str) -> Self {
        self.display = display.to_string();
        self
    }

    /// Set computed `visibility`
    pub fn with_visibility(mut self, visibility: &str) -> Self {
        self.visibility = visibility.to_string();
        self
    }

    /// Append a child element
    pub fn with_child(mut self, child: ElementSpec) -> Self {
        self.children.push(child);
        self
    }
}

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    attributes: BTreeMap<String, String>,
    text: Option<String>,
    display: String,
    visibility: String,
    rect: Rect,
    parent: Option<usize>,
    children: Vec<usize>,
}

/// Arena-backed page snapshot
#[derive(Debug, Clone)]
pub struct DomSnapshot {
    href: String,
    path: String,
    user_agent: String,
    viewport_height: f64,
    scroll_y: f64,
    hidden: bool,
    nodes: Vec<Node>,
}

impl DomSnapshot {
    /// Build a snapshot from a URL and a forest of element specs
    ///
    /// # Errors
    ///
    /// Returns [`QuizTrackError::Page`] if the URL cannot be parsed or the
    /// viewport height is not positive
    pub fn new(
        href: &str,
        user_agent: &str,
        viewport_height: f64,
        roots: Vec<ElementSpec>,
    ) -> Result<Self> {
        let url = url::Url::parse(href)
            .map_err(|e| QuizTrackError::Page(format!("invalid page URL {}: {}", href, e)))?;

        if viewport_height <= 0.0 {
            return Err(QuizTrackError::Page(format!(
                "viewport height must be positive, got {}",
                viewport_height
            ))
            .into());
        }

        let mut snapshot = Self {
            href: href.to_string(),
            path: url.path().to_string(),
            user_agent: user_agent.to_string(),
            viewport_height,
            scroll_y: 0.0,
            hidden: false,
            nodes: Vec::new(),
        };

        for root in roots {
            snapshot.push_node(root, None);
        }

        Ok(snapshot)
    }

    fn push_node(&mut self, spec: ElementSpec, parent: Option<usize>) -> usize {
        let mut attributes = spec.attributes;
        if let Some(id) = spec.id {
            attributes.insert("id".to_string(), id);
        }
        if !spec.classes.is_empty() {
            attributes.insert("class".to_string(), spec.classes.join(" "));
        }

        let index = self.nodes.len();
        self.nodes.push(Node {
            tag: spec.tag.to_ascii_lowercase(),
            attributes,
            text: spec.text,
            display: spec.display,
            visibility: spec.visibility,
            rect: spec.rect,
            parent,
            children: Vec::new(),
        });

        if let Some(p) = parent {
            self.nodes[p].children.push(index);
        }

        for child in spec.children {
            self.push_node(child, Some(index));
        }

        index
    }

    /// Number of elements in the snapshot
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the snapshot has no elements
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Element whose `id` attribute equals `id`
    pub fn element_by_id(&self, id: &str) -> Option<ElementId> {
        self.nodes
            .iter()
            .position(|n| n.attributes.get("id").map(String::as_str) == Some(id))
            .map(ElementId)
    }

    /// Current vertical scroll offset
    pub fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    /// Scroll the viewport to document offset `y`
    pub fn scroll_to(&mut self, y: f64) {
        self.scroll_y = y.max(0.0);
    }

    /// Whether the document is hidden (tab in background)
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Set the document visibility state
    pub fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    /// Add or remove a class on an element
    ///
    /// # Errors
    ///
    /// Returns [`QuizTrackError::Page`] for an unknown element
    pub fn set_class(&mut self, element: ElementId, class: &str, on: bool) -> Result<()> {
        let node = self
            .nodes
            .get_mut(element.0)
            .ok_or_else(|| QuizTrackError::Page(format!("no element {}", element.0)))?;

        let mut classes: Vec<String> = node
            .attributes
            .get("class")
            .map(|c| c.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        classes.retain(|c| c != class);
        if on {
            classes.push(class.to_string());
        }

        if classes.is_empty() {
            node.attributes.remove("class");
        } else {
            node.attributes.insert("class".to_string(), classes.join(" "));
        }
        Ok(())
    }

    /// Move `class` onto the element with id `target`, removing it elsewhere
    ///
    /// This is what a quiz does when it shows the next slide.
    ///
    /// # Errors
    ///
    /// Returns [`QuizTrackError::Page`] when no element has id `target`
    pub fn activate(&mut self, target: &str, class: &str) -> Result<()> {
        let element = self
            .element_by_id(target)
            .ok_or_else(|| QuizTrackError::Page(format!("no element with id {:?}", target)))?;

        for index in 0..self.nodes.len() {
            self.set_class(ElementId(index), class, false)?;
        }
        self.set_class(element, class, true)
    }

    fn node(&self, element: ElementId) -> Option<&Node> {
        self.nodes.get(element.0)
    }

    fn is_displayed(&self, element: ElementId) -> bool {
        let mut current = Some(element.0);
        while let Some(index) = current {
            let node = &self.nodes[index];
            if node.display == "none" {
                return false;
            }
            current = node.parent;
        }
        true
    }

    fn text_content(&self, index: usize, out: &mut String) {
        let node = &self.nodes[index];
        if let Some(text) = &node.text {
            out.push_str(text);
        }
        for child in &node.children {
            self.text_content(*child, out);
        }
    }

    fn descendants(&self, index: usize, out: &mut Vec<usize>) {
        for child in &self.nodes[index].children {
            out.push(*child);
            self.descendants(*child, out);
        }
    }
}

impl PageView for DomSnapshot {
    fn href(&self) -> &str {
        &self.href
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn user_agent(&self) -> &str {
        &self.user_agent
    }

    fn viewport_height(&self) -> f64 {
        self.viewport_height
    }

    fn elements(&self) -> Vec<ElementId> {
        (0..self.nodes.len()).map(ElementId).collect()
    }

    fn attribute(&self, element: ElementId, name: &str) -> Option<&str> {
        self.node(element)?.attributes.get(name).map(String::as_str)
    }

    fn tag(&self, element: ElementId) -> Option<&str> {
        self.node(element).map(|n| n.tag.as_str())
    }

    fn parent(&self, element: ElementId) -> Option<ElementId> {
        self.node(element)?.parent.map(ElementId)
    }

    fn bounding_rect(&self, element: ElementId) -> Rect {
        match self.node(element) {
            Some(node) if self.is_displayed(element) => Rect {
                top: node.rect.top - self.scroll_y,
                height: node.rect.height,
                width: node.rect.width,
            },
            _ => Rect::default(),
        }
    }

    fn is_rendered(&self, element: ElementId) -> bool {
        match self.node(element) {
            Some(node) => node.display != "none" && node.visibility != "hidden",
            None => false,
        }
    }

    fn first_heading_text(&self, element: ElementId) -> Option<String> {
        self.node(element)?;
        let mut descendants = Vec::new();
        self.descendants(element.0, &mut descendants);

        descendants
            .into_iter()
            .find(|index| {
                matches!(
                    self.nodes[*index].tag.as_str(),
                    "h1" | "h2" | "h3" | "h4" | "h5" | "h6"
                )
            })
            .map(|index| {
                let mut text = String::new();
                self.text_content(index, &mut text);
                text.trim().to_string()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiz_page() -> DomSnapshot {
        DomSnapshot::new(
            "https://quiz.example.com/funnels/lead2.html?ref=ad",
            "Mozilla/5.0",
            800.0,
            vec![ElementSpec::new("main")
                .with_rect(0.0, 1200.0, 2400.0)
                .with_child(
                    ElementSpec::new("section")
                        .with_id("slide-1")
                        .with_classes(&["slide", "active"])
                        .with_rect(0.0, 1200.0, 800.0)
                        .with_child(ElementSpec::new("p").with_text("intro"))
                        .with_child(
                            ElementSpec::new("h2")
                                .with_text("  What is your ")
                                .with_child(ElementSpec::new("em").with_text("goal?  ")),
                        ),
                )
                .with_child(
                    ElementSpec::new("section")
                        .with_id("slide-2")
                        .with_classes(&["slide"])
                        .with_rect(800.0, 1200.0, 800.0),
                )
                .with_child(
                    ElementSpec::new("section")
                        .with_id("slide-3")
                        .with_display("none")
                        .with_rect(1600.0, 1200.0, 800.0)
                        .with_child(ElementSpec::new("div").with_rect(1600.0, 500.0, 500.0)),
                )],
        )
        .unwrap()
    }

    #[test]
    fn test_document_order_and_path() {
        let page = quiz_page();
        assert_eq!(page.len(), 8);
        assert_eq!(page.path(), "/funnels/lead2.html");
        assert_eq!(page.tag(ElementId(0)), Some("main"));
        assert_eq!(page.attribute(ElementId(1), "id"), Some("slide-1"));
        assert_eq!(page.parent(ElementId(1)), Some(ElementId(0)));
    }

    #[test]
    fn test_invalid_url_rejected() {
        assert!(DomSnapshot::new("not a url", "ua", 800.0, vec![]).is_err());
        assert!(DomSnapshot::new("https://a.b/", "ua", 0.0, vec![]).is_err());
    }

    #[test]
    fn test_heading_text_includes_descendants() {
        let page = quiz_page();
        let slide = page.element_by_id("slide-1").unwrap();
        assert_eq!(
            page.first_heading_text(slide).as_deref(),
            Some("What is your goal?")
        );
        let slide2 = page.element_by_id("slide-2").unwrap();
        assert_eq!(page.first_heading_text(slide2), None);
    }

    #[test]
    fn test_bounding_rect_follows_scroll() {
        let mut page = quiz_page();
        let slide2 = page.element_by_id("slide-2").unwrap();
        assert_eq!(page.bounding_rect(slide2).top, 800.0);
        page.scroll_to(600.0);
        assert_eq!(page.bounding_rect(slide2).top, 200.0);
        page.scroll_to(-5.0);
        assert_eq!(page.scroll_y(), 0.0);
    }

    #[test]
    fn test_display_none_hides_subtree_box() {
        let page = quiz_page();
        let slide3 = page.element_by_id("slide-3").unwrap();
        assert!(!page.is_rendered(slide3));
        assert_eq!(page.bounding_rect(slide3), Rect::default());
        // Child keeps its own style but has no box.
        let child = ElementId(slide3.0 + 1);
        assert!(page.is_rendered(child));
        assert_eq!(page.bounding_rect(child).height, 0.0);
    }

    #[test]
    fn test_activate_moves_class() {
        let mut page = quiz_page();
        page.activate("slide-2", "active").unwrap();
        let slide1 = page.element_by_id("slide-1").unwrap();
        let slide2 = page.element_by_id("slide-2").unwrap();
        assert_eq!(page.attribute(slide1, "class"), Some("slide"));
        assert_eq!(page.attribute(slide2, "class"), Some("slide active"));
        assert!(page.activate("slide-99", "active").is_err());
    }

    #[test]
    fn test_element_spec_from_yaml_defaults() {
        let spec: ElementSpec = serde_yaml::from_str("id: q1\nclasses: [question]\n").unwrap();
        assert_eq!(spec.tag, "div");
        assert_eq!(spec.display, "block");
        assert_eq!(spec.visibility, "visible");
        assert!(spec.children.is_empty());
    }
}
