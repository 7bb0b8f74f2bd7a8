//! Terminal rendering of dashboard views
//!
//! Every function returns the rendered text instead of printing it, so the
//! dashboard can assemble a whole frame before it reaches the terminal.

use crate::dashboard::report::QuizListing;
use crate::dashboard::view::{
    quiz_option_label, AnswerCard, DropOffRow, FunnelItem, FunnelTooltip, Overview, SlideDetail,
    SummaryLine,
};
use colored::Colorize;
use prettytable::{format, row, Table};

/// Error banner
pub fn error_banner(message: &str) -> String {
    format!("{} {}\n", "✖".red().bold(), message.red())
}

/// Loading indicator
pub fn loading_line(quiz_id: &str) -> String {
    format!("{} {}\n", "…".dimmed(), format!("Loading analytics for {}", quiz_id).dimmed())
}

/// Headline counters
pub fn overview(view: &Overview) -> String {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(row![
        "Total Users".bold(),
        "Completed".bold(),
        "Completion Rate".bold()
    ]);
    table.add_row(row![
        view.total_users,
        view.completed_users,
        view.completion_rate.green()
    ]);
    table.to_string()
}

/// Funnel results list
pub fn funnel_results(items: &[FunnelItem]) -> String {
    let mut out = String::new();
    for item in items {
        let line = format!("{}: {} users", item.label, item.users);
        if item.completion {
            out.push_str(&format!("  {} {}\n", "✔".green(), line.green().bold()));
        } else {
            out.push_str(&format!("  • {}\n", line));
        }
    }
    out
}

/// Hover texts of the funnel bars, one block per bar under its label
pub fn funnel_tooltips(labels: &[String], tooltips: &[FunnelTooltip]) -> String {
    let mut out = String::new();
    for (label, tooltip) in labels.iter().zip(tooltips) {
        out.push_str(&format!("  {}
", label.bold()));
        out.push_str(&format!("    {}
", tooltip.reached));
        out.push_str(&format!("    {}
", tooltip.drop_off.red()));
    }
    out
}

/// Drop-off table, rows numbered for the detail view
pub fn drop_off_table(rows: &[DropOffRow]) -> String {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(row![
        "Slide ID".bold(),
        "Title".bold(),
        "Users Reached".bold(),
        "Drop-off".bold(),
        "Drop-off %".bold(),
        "Retention".bold()
    ]);

    for r in rows {
        table.add_row(row![
            r.slide_id.cyan(),
            r.slide_title,
            r.users_reached,
            r.drop_off_count.red(),
            r.drop_off_percentage.red(),
            r.retention.green()
        ]);
    }

    table.to_string()
}

/// Detail view of one slide
pub fn slide_detail(detail: &SlideDetail) -> String {
    let mut out = format!("{}\n", detail.title.bold());
    for (label, value) in &detail.fields {
        out.push_str(&format!("  {}: {}\n", label.bold(), value));
    }
    out
}

/// Answer distribution cards
pub fn answer_cards(cards: &[AnswerCard]) -> String {
    let mut out = String::new();
    for card in cards {
        out.push_str(&format!("{}\n", card.title.bold()));
        for answer in &card.answers {
            out.push_str(&format!("  {:<30} {}\n", answer.text, answer.stats.dimmed()));
        }
    }
    out
}

/// Quiz picker as a table
pub fn quiz_list(quizzes: &[QuizListing]) -> String {
    if quizzes.is_empty() {
        return format!("{}\n", "No quizzes found.".yellow());
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(row!["Quiz ID".bold(), "Quiz".bold()]);
    for quiz in quizzes {
        table.add_row(row![quiz.quiz_id.cyan(), quiz_option_label(quiz)]);
    }
    table.to_string()
}

/// Live summary list
pub fn summary_lines(lines: &[SummaryLine]) -> String {
    let mut out = String::new();
    for line in lines {
        let users = if line.live {
            line.users.green().bold().to_string()
        } else {
            line.users.clone()
        };
        out.push_str(&format!("  {:<40} {}", line.label, users));
        if line.live {
            out.push_str(&format!(" {}", "● LIVE NOW".red().bold()));
        }
        out.push('\n');
    }
    out
}

/// Section heading
pub fn heading(text: &str) -> String {
    format!("\n{}\n", text.bold().underline())
}
