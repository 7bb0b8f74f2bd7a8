//! Slide detection
//!
//! Finds the slides of a quiz page without knowing its markup, resolves
//! which one the visitor is looking at, and derives the slide's id, title,
//! and sequence number.

use crate::config::TrackerConfig;
use crate::error::Result;
use crate::page::{ElementId, PageView, Rect, Selector};
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// Id reported for a slide with no id or data attribute
pub const UNKNOWN_SLIDE_ID: &str = "unknown";

/// Title reported for a slide with no heading
pub const UNTITLED_SLIDE: &str = "Untitled Slide";

/// A detected slide element and what the tracker reports about it
///
/// The element handle is observational; the tracker never mutates the page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlideRef {
    /// Element on the page
    pub element: ElementId,
    /// Slide identifier
    pub slide_id: String,
    /// Heading text
    pub title: String,
    /// Position in the quiz
    pub sequence: u32,
}

/// Slide detector configured with selectors and heuristics
#[derive(Debug, Clone)]
pub struct SlideDetector {
    selectors: Vec<Selector>,
    active: Selector,
    min_size_px: f64,
    max_fallback: usize,
}

impl SlideDetector {
    /// Create a detector with the default visibility thresholds
    /// (100 px, at most 20 fallback slides)
    pub fn new(selectors: Vec<Selector>, active: Selector) -> Self {
        Self {
            selectors,
            active,
            min_size_px: 100.0,
            max_fallback: 20,
        }
    }

    /// Build a detector from tracker configuration
    ///
    /// # Errors
    ///
    /// Returns error if any configured selector fails to parse
    pub fn from_config(config: &TrackerConfig) -> Result<Self> {
        let selectors = config
            .slide_selectors
            .iter()
            .map(|s| Selector::parse(s))
            .collect::<Result<Vec<_>>>()?;
        let active = Selector::parse(&config.active_selector)?;

        Ok(Self {
            selectors,
            active,
            min_size_px: config.min_slide_size_px,
            max_fallback: config.max_fallback_slides,
        })
    }

    /// Find the slides on a page
    ///
    /// The first selector that matches anything wins. When none match, the
    /// visibility heuristic of [`SlideDetector::detect_by_visibility`] is
    /// used.
    pub fn detect<P: PageView + ?Sized>(&self, page: &P) -> Vec<ElementId> {
        for selector in &self.selectors {
            let found = page.query_all(selector);
            if !found.is_empty() {
                tracing::debug!(
                    count = found.len(),
                    selector = %selector,
                    "Found slides using selector"
                );
                return found;
            }
        }

        let found = self.detect_by_visibility(page);
        tracing::debug!(count = found.len(), "Found slides by visibility");
        found
    }

    /// Elements that are displayed, visible, and larger than the size
    /// threshold in both dimensions, capped in document order
    pub fn detect_by_visibility<P: PageView + ?Sized>(&self, page: &P) -> Vec<ElementId> {
        page.elements()
            .into_iter()
            .filter(|el| {
                let rect = page.bounding_rect(*el);
                page.is_rendered(*el)
                    && rect.height > self.min_size_px
                    && rect.width > self.min_size_px
            })
            .take(self.max_fallback)
            .collect()
    }

    /// The slide the visitor is on
    ///
    /// An element matching the active selector wins; otherwise the slide
    /// with the greatest visibility fraction. `None` when nothing is active
    /// and no slide is on screen.
    pub fn current_slide<P: PageView + ?Sized>(
        &self,
        page: &P,
        slides: &[ElementId],
    ) -> Option<ElementId> {
        page.query(&self.active)
            .or_else(|| most_visible(page, slides))
    }

    /// Derive id, title and sequence for an element
    pub fn describe<P: PageView + ?Sized>(&self, page: &P, element: ElementId) -> SlideRef {
        let slide_id = slide_id(page, element);
        let sequence = slide_sequence(&slide_id);
        SlideRef {
            element,
            title: slide_title(page, element),
            slide_id,
            sequence,
        }
    }
}

/// Fraction of the element's height inside `[0, viewport_height]`
///
/// Always in `[0, 1]`; exactly 0 when the element is fully above or below
/// the viewport or has no height.
///
/// # Examples
///
/// ```
/// use quiztrack::page::Rect;
/// use quiztrack::tracker::detector::visibility_fraction;
///
/// assert_eq!(visibility_fraction(Rect::new(-100.0, 500.0, 400.0), 800.0), 0.75);
/// assert_eq!(visibility_fraction(Rect::new(900.0, 500.0, 400.0), 800.0), 0.0);
/// ```
pub fn visibility_fraction(rect: Rect, viewport_height: f64) -> f64 {
    if rect.height <= 0.0 || rect.bottom() < 0.0 || rect.top > viewport_height {
        return 0.0;
    }

    let visible = rect.bottom().min(viewport_height) - rect.top.max(0.0);
    (visible / rect.height).clamp(0.0, 1.0)
}

/// Slide with the strictly greatest visibility; earlier slides win ties
pub fn most_visible<P: PageView + ?Sized>(page: &P, slides: &[ElementId]) -> Option<ElementId> {
    let viewport = page.viewport_height();
    let mut best: Option<(ElementId, f64)> = None;

    for el in slides {
        let visibility = visibility_fraction(page.bounding_rect(*el), viewport);
        let current_max = best.map(|(_, v)| v).unwrap_or(0.0);
        if visibility > current_max {
            best = Some((*el, visibility));
        }
    }

    best.map(|(el, _)| el)
}

/// `id`, else `data-slide`, else `data-step`, else `"unknown"`
pub fn slide_id<P: PageView + ?Sized>(page: &P, element: ElementId) -> String {
    ["id", "data-slide", "data-step"]
        .iter()
        .filter_map(|attr| page.attribute(element, attr))
        .find(|value| !value.is_empty())
        .unwrap_or(UNKNOWN_SLIDE_ID)
        .to_string()
}

/// First heading text, else `"Untitled Slide"`
pub fn slide_title<P: PageView + ?Sized>(page: &P, element: ElementId) -> String {
    page.first_heading_text(element)
        .unwrap_or_else(|| UNTITLED_SLIDE.to_string())
}

/// First run of digits in the slide id, else 1
pub fn slide_sequence(slide_id: &str) -> u32 {
    static DIGITS: OnceLock<Regex> = OnceLock::new();
    let digits = DIGITS.get_or_init(|| Regex::new(r"[0-9]+").unwrap());

    digits
        .find(slide_id)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(1)
}
