//! View models
//!
//! Pure functions from report data to what the dashboard shows: formatted
//! counters, funnel bars with their tooltips, drop-off rows, answer cards,
//! and the live summary lines. Nothing here does I/O or draws.

use crate::dashboard::chart::{Band, ChartKind, ChartSpec, Series};
use crate::dashboard::report::{
    AnalyticsReport, AnswerStat, DropOffEntry, FunnelEntry, QuizListing, QuizSummary,
    SlideAnalytics, Stats,
};
use serde::Serialize;

/// Longest funnel chart label before truncation
pub const MAX_LABEL_CHARS: usize = 20;

/// Format a count with thousands separators
///
/// # Examples
///
/// ```
/// use quiztrack::dashboard::view::format_number;
///
/// assert_eq!(format_number(1234567), "1,234,567");
/// assert_eq!(format_number(999), "999");
/// ```
pub fn format_number(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Format a percentage the way the backend sent it: integral values
/// without decimals, others in shortest form
pub fn format_percentage(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}%", value)
    } else {
        format!("{}%", value)
    }
}

/// Cut `label` to [`MAX_LABEL_CHARS`] characters plus `...`
pub fn truncate_label(label: &str) -> String {
    if label.chars().count() > MAX_LABEL_CHARS {
        let head: String = label.chars().take(MAX_LABEL_CHARS).collect();
        format!("{}...", head)
    } else {
        label.to_string()
    }
}

/// Retention shown next to a drop-off percentage
pub fn retention_percentage(drop_off_percentage: f64) -> f64 {
    100.0 - drop_off_percentage
}

/// Headline counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Overview {
    /// Visitors who started
    pub total_users: String,
    /// Visitors who finished
    pub completed_users: String,
    /// Completion rate with `%`
    pub completion_rate: String,
}

impl Overview {
    /// Build the counters from report stats
    pub fn from_stats(stats: &Stats) -> Self {
        Self {
            total_users: format_number(stats.total_users),
            completed_users: format_number(stats.completed_users),
            completion_rate: format_percentage(stats.completion_rate),
        }
    }
}

/// Line of the funnel results list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunnelItem {
    /// Slide title or id
    pub label: String,
    /// Users reached, formatted
    pub users: String,
    /// Whether this step counts as completing the quiz
    pub completion: bool,
}

/// Funnel results list
///
/// A step is the completion item when its id mentions `completion` or
/// `final`, and the last step always is.
pub fn funnel_items(funnel: &[FunnelEntry]) -> Vec<FunnelItem> {
    let last = funnel.len().saturating_sub(1);
    funnel
        .iter()
        .enumerate()
        .map(|(index, entry)| FunnelItem {
            label: entry.label().to_string(),
            users: format_number(entry.users_reached),
            completion: entry.slide_id.contains("completion")
                || entry.slide_id.contains("final")
                || index == last,
        })
        .collect()
}

/// Hover texts of one funnel bar pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunnelTooltip {
    /// Users reached and their share of the first step, 1 decimal
    pub reached: String,
    /// Drop-off and its share of users on the step, 2 decimals
    pub drop_off: String,
}

/// Funnel bar chart plus tooltips
#[derive(Debug, Clone, PartialEq)]
pub struct FunnelChart {
    /// Chart description
    pub spec: ChartSpec,
    /// One tooltip pair per bar
    pub tooltips: Vec<FunnelTooltip>,
}

/// Build the funnel chart; `None` when there is no funnel data
pub fn funnel_chart(funnel: &[FunnelEntry]) -> Option<FunnelChart> {
    if funnel.is_empty() {
        return None;
    }

    let first = funnel[0].users_reached;
    let tooltips = funnel
        .iter()
        .map(|entry| {
            let reached_share = if first > 0 {
                entry.users_reached as f64 / first as f64 * 100.0
            } else {
                0.0
            };
            let drop_share = if entry.users_reached > 0 {
                entry.drop_off as f64 / entry.users_reached as f64 * 100.0
            } else {
                0.0
            };
            FunnelTooltip {
                reached: format!("Users Reached: {} ({:.1}%)", entry.users_reached, reached_share),
                drop_off: format!(
                    "Drop-off: {} ({:.2}% of users on this slide)",
                    entry.drop_off, drop_share
                ),
            }
        })
        .collect();

    let spec = ChartSpec {
        kind: ChartKind::Bar,
        title: "Quiz Funnel - User Journey".to_string(),
        labels: funnel.iter().map(|e| truncate_label(e.label())).collect(),
        series: vec![
            Series::new(
                "Users Reached",
                funnel.iter().map(|e| e.users_reached as f64).collect(),
            ),
            Series::new("Drop-off", funnel.iter().map(|e| e.drop_off as f64).collect())
                .with_bands(vec![Band::Red; funnel.len()]),
        ],
        max: None,
    };

    Some(FunnelChart { spec, tooltips })
}

/// Row of the drop-off table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DropOffRow {
    /// Slide identifier
    pub slide_id: String,
    /// Slide heading
    pub slide_title: String,
    /// Users reached, formatted
    pub users_reached: String,
    /// Drop-off count, formatted
    pub drop_off_count: String,
    /// Drop-off percentage as sent
    pub drop_off_percentage: String,
    /// `100 - drop-off`, 1 decimal
    pub retention: String,
}

impl DropOffRow {
    /// Build a row from an analysis entry
    pub fn from_entry(entry: &DropOffEntry) -> Self {
        Self {
            slide_id: entry.slide_id.clone(),
            slide_title: entry.slide_title.clone(),
            users_reached: format_number(entry.users_reached),
            drop_off_count: format_number(entry.drop_off_count),
            drop_off_percentage: format_percentage(entry.drop_off_percentage),
            retention: format!("{:.1}%", retention_percentage(entry.drop_off_percentage)),
        }
    }
}

/// Detail view of one drop-off row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlideDetail {
    /// Heading
    pub title: String,
    /// Label and value pairs
    pub fields: Vec<(String, String)>,
}

impl SlideDetail {
    /// Build the detail view of an analysis entry
    pub fn from_entry(entry: &DropOffEntry) -> Self {
        let row = DropOffRow::from_entry(entry);
        Self {
            title: format!("Slide Details: {}", entry.slide_title),
            fields: vec![
                ("Slide ID".to_string(), row.slide_id),
                ("Title".to_string(), row.slide_title),
                ("Sequence".to_string(), entry.sequence_order.to_string()),
                ("Users Reached".to_string(), row.users_reached),
                ("Drop-off Count".to_string(), row.drop_off_count),
                ("Drop-off Percentage".to_string(), row.drop_off_percentage),
                ("Retention Rate".to_string(), row.retention),
            ],
        }
    }
}

/// Answer line of a card
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerLine {
    /// Answer text or value
    pub text: String,
    /// `count (pct%)`
    pub stats: String,
}

/// Answers of one slide
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerCard {
    /// Slide identifier
    pub slide_id: String,
    /// Funnel title of the slide, else its id
    pub title: String,
    /// Answers in payload order
    pub answers: Vec<AnswerLine>,
}

/// Group answers into cards, one per slide id in first-seen order
pub fn answer_cards(report: &AnalyticsReport) -> Vec<AnswerCard> {
    let mut cards: Vec<AnswerCard> = Vec::new();

    for answer in &report.answer_analytics {
        let line = answer_line(answer);
        match cards.iter_mut().find(|c| c.slide_id == answer.slide_id) {
            Some(card) => card.answers.push(line),
            None => cards.push(AnswerCard {
                slide_id: answer.slide_id.clone(),
                title: slide_title(report, &answer.slide_id),
                answers: vec![line],
            }),
        }
    }

    cards
}

fn answer_line(answer: &AnswerStat) -> AnswerLine {
    AnswerLine {
        text: answer.display_text().to_string(),
        stats: format!(
            "{} ({})",
            answer.selection_count,
            format_percentage(answer.selection_percentage)
        ),
    }
}

fn slide_title(report: &AnalyticsReport, slide_id: &str) -> String {
    report
        .funnel
        .iter()
        .find(|f| f.slide_id == slide_id)
        .map(|f| f.label().to_string())
        .unwrap_or_else(|| slide_id.to_string())
}

/// Option label of the quiz picker
pub fn quiz_option_label(quiz: &QuizListing) -> String {
    format!("{} ({} sessions)", quiz.title, quiz.total_sessions)
}

/// Line of the live summary list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryLine {
    /// Left-hand label
    pub label: String,
    /// User counts
    pub users: String,
    /// Whether someone is on the slide right now
    pub live: bool,
}

/// Live summary list: one line per slide, then completed and active lines
pub fn summary_lines(summary: &QuizSummary) -> Vec<SummaryLine> {
    let mut lines: Vec<SummaryLine> = summary
        .slide_analytics
        .iter()
        .map(|slide| {
            let users = if slide.active_users > 0 {
                format!("{} active / {} total", slide.active_users, slide.unique_users)
            } else if slide.unique_users > 0 {
                format!("{} users (0 active)", slide.unique_users)
            } else {
                format!("{} users", slide.unique_users)
            };
            SummaryLine {
                label: format!("Slide {}: {}", slide.slide_sequence, slide.slide_title),
                users,
                live: slide.active_users > 0,
            }
        })
        .collect();

    lines.push(SummaryLine {
        label: "Completed".to_string(),
        users: format!("{} users", summary.completed_sessions),
        live: false,
    });

    if summary.active_users > 0 {
        lines.push(SummaryLine {
            label: "Currently Active".to_string(),
            users: format!("{} users", summary.active_users),
            live: true,
        });
    }

    lines
}

/// Drop-off between consecutive slides by visit count, rounded; the first
/// slide is always 0
pub fn drop_off_rates(slides: &[SlideAnalytics]) -> Vec<i64> {
    slides
        .iter()
        .enumerate()
        .map(|(i, slide)| {
            if i == 0 {
                return 0;
            }
            let previous = slides[i - 1].visit_count as f64;
            if previous <= 0.0 {
                return 0;
            }
            ((previous - slide.visit_count as f64) / previous * 100.0).round() as i64
        })
        .collect()
}

/// Colour of a drop-off rate: above 50 red, above 25 yellow, else green
pub fn rate_band(rate: i64) -> Band {
    if rate > 50 {
        Band::Red
    } else if rate > 25 {
        Band::Yellow
    } else {
        Band::Green
    }
}

/// Unique users per slide as a line chart
pub fn retention_chart(summary: &QuizSummary) -> ChartSpec {
    ChartSpec {
        kind: ChartKind::Line,
        title: "Users per Slide".to_string(),
        labels: slide_labels(&summary.slide_analytics),
        series: vec![Series::new(
            "Users",
            summary
                .slide_analytics
                .iter()
                .map(|s| s.unique_users as f64)
                .collect(),
        )],
        max: None,
    }
}

/// Drop-off rates as a bar chart capped at 100
pub fn drop_off_chart(summary: &QuizSummary) -> ChartSpec {
    let rates = drop_off_rates(&summary.slide_analytics);
    ChartSpec {
        kind: ChartKind::Bar,
        title: "Drop-off Rate (%)".to_string(),
        labels: slide_labels(&summary.slide_analytics),
        series: vec![Series::new(
            "Drop-off Rate (%)",
            rates.iter().map(|r| *r as f64).collect(),
        )
        .with_bands(rates.iter().map(|r| rate_band(*r)).collect())],
        max: Some(100.0),
    }
}

fn slide_labels(slides: &[SlideAnalytics]) -> Vec<String> {
    slides
        .iter()
        .map(|s| format!("Slide {}", s.slide_sequence))
        .collect()
}
