//! Recorded quiz page scenarios
//!
//! A scenario is a page (URL, user agent, viewport, element tree) plus the
//! steps a visitor took on it. The `track` command replays scenarios
//! through the tracker.
//!
//! ```yaml
//! url: https://quiz.example.com/lead2
//! viewport_height: 800
//! elements:
//!   - id: slide-1
//!     classes: [slide, active]
//!     rect: { top: 0, width: 1200, height: 800 }
//! steps:
//!   - action: click
//!     target: next-1
//!     activate: slide-2
//!   - action: wait
//!     ms: 1500
//! ```

use crate::error::{QuizTrackError, Result};
use crate::page::dom::{DomSnapshot, ElementSpec};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One visitor interaction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Click the element with id `target`, after the page reacts by
    /// optionally activating another slide and scrolling
    Click {
        /// Id attribute of the clicked element
        target: String,
        /// Id of the slide the quiz shows in response
        #[serde(default)]
        activate: Option<String>,
        /// Document offset the page scrolls to in response
        #[serde(default)]
        scroll_to: Option<f64>,
    },
    /// Mark the element with id `target` active without a click
    Activate {
        /// Id attribute of the slide to activate
        target: String,
    },
    /// Scroll the viewport to document offset `y`
    Scroll {
        /// Document offset
        y: f64,
    },
    /// Tab goes to the background
    Hide,
    /// Tab comes back to the foreground
    Show,
    /// Page is being unloaded
    Unload,
    /// Let time pass
    Wait {
        /// Milliseconds to wait
        ms: u64,
    },
    /// Visitor finished the quiz
    Complete,
}

/// Page plus the steps replayed on it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Page URL
    pub url: String,

    /// Browser user agent
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Viewport height in px
    #[serde(default = "default_viewport_height")]
    pub viewport_height: f64,

    /// Root elements of the page
    #[serde(default)]
    pub elements: Vec<ElementSpec>,

    /// Visitor interactions in order
    #[serde(default)]
    pub steps: Vec<Step>,
}

fn default_user_agent() -> String {
    format!("quiztrack/{}", env!("CARGO_PKG_VERSION"))
}

fn default_viewport_height() -> f64 {
    800.0
}

impl Scenario {
    /// Load a scenario from a YAML or JSON file
    ///
    /// YAML is a superset of JSON, so both go through `serde_yaml`.
    ///
    /// # Errors
    ///
    /// Returns [`QuizTrackError::Scenario`] when the file cannot be read or
    /// parsed
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            QuizTrackError::Scenario(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_str(&contents)
            .map_err(|e| QuizTrackError::Scenario(format!("{}: {}", path.display(), e)).into())
    }

    /// Parse a scenario from YAML or JSON text
    ///
    /// # Errors
    ///
    /// Returns the parser error
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(contents: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(contents)
    }

    /// Build the initial page
    ///
    /// # Errors
    ///
    /// Returns [`QuizTrackError::Page`] for an invalid URL or viewport
    pub fn build_page(&self) -> Result<DomSnapshot> {
        DomSnapshot::new(
            &self.url,
            &self.user_agent,
            self.viewport_height,
            self.elements.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::PageView;

    const SCENARIO: &str = r#"
url: https://quiz.example.com/lead2
viewport_height: 900
elements:
  - id: slide-1
    classes: [slide, active]
    rect: { top: 0, width: 1200, height: 900 }
    children:
      - tag: h2
        text: First question
      - id: next-1
        tag: button
        classes: [btn-next]
  - id: slide-2
    classes: [slide]
    rect: { top: 900, width: 1200, height: 900 }
steps:
  - action: click
    target: next-1
    activate: slide-2
  - action: wait
    ms: 10
  - action: hide
  - action: show
  - action: complete
"#;

    #[test]
    fn test_parse_scenario() {
        let scenario = Scenario::from_str(SCENARIO).unwrap();
        assert_eq!(scenario.viewport_height, 900.0);
        assert_eq!(scenario.elements.len(), 2);
        assert_eq!(scenario.steps.len(), 5);
        assert_eq!(
            scenario.steps[0],
            Step::Click {
                target: "next-1".to_string(),
                activate: Some("slide-2".to_string()),
                scroll_to: None,
            }
        );
        assert_eq!(scenario.steps[1], Step::Wait { ms: 10 });
        assert!(scenario.user_agent.starts_with("quiztrack/"));
    }

    #[test]
    fn test_build_page() {
        let scenario = Scenario::from_str(SCENARIO).unwrap();
        let page = scenario.build_page().unwrap();
        assert_eq!(page.len(), 4);
        assert_eq!(page.path(), "/lead2");
        assert_eq!(page.viewport_height(), 900.0);
    }

    #[test]
    fn test_json_scenario() {
        let json = r#"{"url":"https://q.example.com/a.html","steps":[{"action":"unload"}]}"#;
        let scenario = Scenario::from_str(json).unwrap();
        assert_eq!(scenario.steps, vec![Step::Unload]);
        assert!(scenario.elements.is_empty());
    }

    #[test]
    fn test_unknown_action_rejected() {
        let yaml = "url: https://q.example.com/\nsteps:\n  - action: teleport\n";
        assert!(Scenario::from_str(yaml).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = Scenario::load(Path::new("/nonexistent/scenario.yaml")).unwrap_err();
        assert!(err.to_string().contains("Scenario error"));
    }
}
