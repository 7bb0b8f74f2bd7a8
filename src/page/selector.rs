//! Selector language for slide detection
//!
//! Supports the subset of CSS selectors quiz markup is detected with:
//!
//! - `[attr]` attribute presence
//! - `[class*="part"]` class attribute substring
//! - `.a` and compound `.a.b` class selectors
//! - `sel, sel` alternatives
//!
//! Anything else (ids, descendants, pseudo-classes) is rejected at parse
//! time so misconfigured selector lists fail during config validation.

use crate::error::{QuizTrackError, Result};
use crate::page::{ElementId, PageView};
use std::fmt;

/// One simple selector
#[derive(Debug, Clone, PartialEq, Eq)]
enum Simple {
    /// `[name]`
    HasAttribute(String),
    /// `[class*="part"]`
    ClassContains(String),
    /// `.a.b` - every class must be present
    Classes(Vec<String>),
}

/// Parsed selector, possibly a list of alternatives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    alternatives: Vec<Simple>,
}

impl Selector {
    /// Parse a selector string
    ///
    /// # Errors
    ///
    /// Returns [`QuizTrackError::Selector`] for empty or unsupported syntax
    ///
    /// # Examples
    ///
    /// ```
    /// use quiztrack::page::Selector;
    ///
    /// assert!(Selector::parse(".slide.active").is_ok());
    /// assert!(Selector::parse("[class*=\"step\"]").is_ok());
    /// assert!(Selector::parse("#main").is_err());
    /// ```
    pub fn parse(source: &str) -> Result<Self> {
        let mut alternatives = Vec::new();
        for part in source.split(',') {
            let part = part.trim();
            if part.is_empty() {
                return Err(QuizTrackError::Selector(format!("empty selector in {:?}", source)).into());
            }
            alternatives.push(Self::parse_simple(part)?);
        }

        Ok(Self {
            source: source.to_string(),
            alternatives,
        })
    }

    fn parse_simple(part: &str) -> Result<Simple> {
        if let Some(inner) = part.strip_prefix('[').and_then(|p| p.strip_suffix(']')) {
            if let Some((name, value)) = inner.split_once("*=") {
                if name.trim() != "class" {
                    return Err(QuizTrackError::Selector(format!(
                        "substring match only supported on class: {}",
                        part
                    ))
                    .into());
                }
                let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
                if value.is_empty() {
                    return Err(QuizTrackError::Selector(format!("empty substring: {}", part)).into());
                }
                return Ok(Simple::ClassContains(value.to_string()));
            }
            let name = inner.trim();
            if name.is_empty() || !name.chars().all(is_ident_char) {
                return Err(QuizTrackError::Selector(format!("bad attribute: {}", part)).into());
            }
            return Ok(Simple::HasAttribute(name.to_string()));
        }

        if let Some(rest) = part.strip_prefix('.') {
            let classes: Vec<String> = rest.split('.').map(|c| c.to_string()).collect();
            if classes
                .iter()
                .any(|c| c.is_empty() || !c.chars().all(is_ident_char))
            {
                return Err(QuizTrackError::Selector(format!("bad class selector: {}", part)).into());
            }
            return Ok(Simple::Classes(classes));
        }

        Err(QuizTrackError::Selector(format!("unsupported selector: {}", part)).into())
    }

    /// Whether `element` matches any alternative
    pub fn matches<P: PageView + ?Sized>(&self, page: &P, element: ElementId) -> bool {
        let class_attr = page.attribute(element, "class").unwrap_or("");
        self.alternatives.iter().any(|simple| match simple {
            Simple::HasAttribute(name) => page.attribute(element, name).is_some(),
            Simple::ClassContains(part) => class_attr.contains(part.as_str()),
            Simple::Classes(classes) => classes
                .iter()
                .all(|c| class_attr.split_whitespace().any(|have| have == c)),
        })
    }

    /// The selector as written
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}
