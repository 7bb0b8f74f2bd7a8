//! Quiz id resolution
//!
//! A page either carries a fixed quiz id (single-quiz deployments) or the
//! id is derived from the last segment of the URL path.

use serde::{Deserialize, Serialize};

/// How a tracker decides which quiz it is on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum QuizIdStrategy {
    /// Last path segment, extension stripped, with a fallback for
    /// malformed ids
    #[default]
    FromPath,
    /// Constant id; the reported URL path becomes `/{quiz_id}`
    Fixed {
        /// The quiz id
        quiz_id: String,
    },
}

/// Resolved quiz id and the URL path reported to the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizIdentity {
    /// Quiz identifier
    pub quiz_id: String,
    /// Path sent with the session-start request
    pub url_path: String,
}

impl QuizIdStrategy {
    /// Resolve the quiz identity for a page path
    ///
    /// # Arguments
    ///
    /// * `path` - URL path of the page
    /// * `fallback` - Id used when the path yields a malformed id
    /// * `max_len` - Longest id accepted from the path
    ///
    /// # Examples
    ///
    /// ```
    /// use quiztrack::tracker::QuizIdStrategy;
    ///
    /// let identity = QuizIdStrategy::FromPath.resolve("/quizzes/lead2.html", "lead2", 50);
    /// assert_eq!(identity.quiz_id, "lead2");
    /// assert_eq!(identity.url_path, "/quizzes/lead2.html");
    /// ```
    pub fn resolve(&self, path: &str, fallback: &str, max_len: usize) -> QuizIdentity {
        match self {
            QuizIdStrategy::FromPath => QuizIdentity {
                quiz_id: quiz_id_from_path(path, fallback, max_len),
                url_path: path.to_string(),
            },
            QuizIdStrategy::Fixed { quiz_id } => QuizIdentity {
                quiz_id: quiz_id.clone(),
                url_path: format!("/{}", quiz_id),
            },
        }
    }
}

/// Derive a quiz id from a URL path
///
/// Takes the last non-empty segment (`"default"` when there is none), cuts
/// it at the first `.`, and replaces it with `fallback` when the result
/// still contains `/` or is longer than `max_len` characters.
pub fn quiz_id_from_path(path: &str, fallback: &str, max_len: usize) -> String {
    let segment = path
        .split('/')
        .filter(|s| !s.is_empty())
        .last()
        .unwrap_or("default");

    let quiz_id = segment.split('.').next().unwrap_or(segment);

    if quiz_id.contains('/') || quiz_id.chars().count() > max_len {
        tracing::debug!(segment, fallback, "Malformed quiz id, using fallback");
        return fallback.to_string();
    }

    quiz_id.to_string()
}
