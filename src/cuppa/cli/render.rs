//! # Rendering Module
//!
//! Turns `CmdResult` data into terminal text. Every `render_*` function returns
//! a `String` so output can be tested without a terminal; colors are applied
//! only when `use_color` is set.
//!
//! Layout (column widths, truncation) is computed with `unicode-width` so
//! non-ASCII coffee names and locations line up.

use colored::{ColoredString, Colorize};
use cuppa::api::{CmdMessage, MessageLevel, Summary};
use cuppa::config::CuppaConfig;
use cuppa::model::Expense;
use std::io::IsTerminal;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Widest a notes cell may get before it is truncated.
pub const NOTES_WIDTH: usize = 32;
const COLUMN_GAP: &str = "  ";

fn stdout_has_color() -> bool {
    std::io::stdout().is_terminal()
}

fn paint(text: &str, use_color: bool, style: fn(&str) -> ColoredString) -> String {
    if use_color {
        style(text).to_string()
    } else {
        text.to_string()
    }
}

pub fn format_amount(amount: f64) -> String {
    format!("{:.2}", amount)
}

/// Renders expenses as a table followed by a total line.
pub fn render_expense_table(expenses: &[Expense], summary: Option<&Summary>, currency: &str) -> String {
    render_expense_table_with(expenses, summary, currency, stdout_has_color())
}

fn render_expense_table_with(
    expenses: &[Expense],
    summary: Option<&Summary>,
    currency: &str,
    use_color: bool,
) -> String {
    if expenses.is_empty() {
        return "No expenses found.\n".to_string();
    }

    let price_header = format!("Price ({})", currency);
    let headers = ["ID", "Date", "Type", "Location", price_header.as_str(), "Notes"];
    let rows: Vec<[String; 6]> = expenses
        .iter()
        .map(|e| {
            [
                e.short_id().to_string(),
                e.date.clone(),
                e.kind.clone(),
                e.location.clone(),
                e.price.clone(),
                truncate_to_width(&single_line(&e.notes), NOTES_WIDTH),
            ]
        })
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.width()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.width());
        }
    }

    let mut out = String::new();
    let header_line = join_padded(headers.iter().map(|h| h.to_string()), &widths);
    out.push_str(&paint(&header_line, use_color, |s| s.bold()));
    out.push('\n');

    for row in &rows {
        let mut cells: Vec<String> = row.iter().cloned().collect();
        cells[0] = pad_to_width(&cells[0], widths[0]);
        let id = paint(&cells[0], use_color, |s| s.yellow());
        let rest = join_padded(cells.into_iter().skip(1), &widths[1..]);
        out.push_str(&format!("{}{}{}", id, COLUMN_GAP, rest));
        out.push('\n');
    }

    if let Some(summary) = summary {
        out.push('\n');
        out.push_str(&render_total_line(summary, currency, use_color));
    }
    out
}

fn render_total_line(summary: &Summary, currency: &str, use_color: bool) -> String {
    let noun = if summary.count == 1 { "expense" } else { "expenses" };
    let mut line = format!(
        "Total: {} {} ({} {})",
        format_amount(summary.total),
        currency,
        summary.count,
        noun
    );
    if summary.unparsed > 0 {
        line.push_str(&format!(", {} without a numeric price", summary.unparsed));
    }
    format!("{}\n", paint(&line, use_color, |s| s.bold()))
}

/// Renders every field of the given expenses, one block each.
pub fn render_expense_details(expenses: &[Expense], currency: &str) -> String {
    render_expense_details_with(expenses, currency, stdout_has_color())
}

fn render_expense_details_with(expenses: &[Expense], currency: &str, use_color: bool) -> String {
    let price_label = format!("Price ({})", currency);
    let mut out = String::new();
    for (i, e) in expenses.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let fields = [
            ("ID", e.id.as_str()),
            ("Type", e.kind.as_str()),
            ("Location", e.location.as_str()),
            (price_label.as_str(), e.price.as_str()),
            ("Date", e.date.as_str()),
            ("Notes", e.notes.as_str()),
        ];
        let label_width = fields.iter().map(|(l, _)| l.width()).max().unwrap_or(0);
        for (label, value) in fields {
            let label = pad_to_width(&format!("{}:", label), label_width + 1);
            out.push_str(&format!("{} {}\n", paint(&label, use_color, |s| s.dimmed()), value));
        }
    }
    out
}

pub fn render_summary(summary: &Summary, currency: &str) -> String {
    render_summary_with(summary, currency, stdout_has_color())
}

fn render_summary_with(summary: &Summary, currency: &str, use_color: bool) -> String {
    if summary.count == 0 {
        return "No expenses recorded.\n".to_string();
    }

    let mut out = String::new();
    out.push_str(&format!("Expenses: {}\n", summary.count));
    out.push_str(&format!(
        "Total:    {} {}\n",
        format_amount(summary.total),
        currency
    ));
    if let Some(avg) = summary.average() {
        out.push_str(&format!("Average:  {} {}\n", format_amount(avg), currency));
    }
    if summary.unparsed > 0 {
        out.push_str(&format!(
            "{}\n",
            paint(
                &format!("{} expense(s) without a numeric price", summary.unparsed),
                use_color,
                |s| s.yellow()
            )
        ));
    }

    out.push('\n');
    out.push_str(&paint("By type:", use_color, |s| s.bold()));
    out.push('\n');
    let kind_width = summary
        .by_type
        .iter()
        .map(|t| t.kind.width())
        .max()
        .unwrap_or(0);
    for t in &summary.by_type {
        out.push_str(&format!(
            "  {}  {:>3} x  {} {}\n",
            pad_to_width(&t.kind, kind_width),
            t.count,
            format_amount(t.total),
            currency
        ));
    }
    out
}

pub fn render_config(config: &CuppaConfig) -> String {
    let mut out = String::new();
    for (key, value) in config.entries() {
        out.push_str(&format!("{} = {}\n", key, value));
    }
    out
}

pub fn render_messages(messages: &[CmdMessage]) -> String {
    render_messages_with(messages, stdout_has_color())
}

fn render_messages_with(messages: &[CmdMessage], use_color: bool) -> String {
    let mut out = String::new();
    for message in messages {
        let line = match message.level {
            MessageLevel::Info => paint(&message.content, use_color, |s| s.dimmed()),
            MessageLevel::Success => paint(&message.content, use_color, |s| s.green()),
            MessageLevel::Warning => paint(&message.content, use_color, |s| s.yellow()),
            MessageLevel::Error => paint(&message.content, use_color, |s| s.red()),
        };
        out.push_str(&line);
        out.push('\n');
    }
    out
}

pub fn print_messages(messages: &[CmdMessage]) {
    print!("{}", render_messages(messages));
}

fn join_padded(cells: impl Iterator<Item = String>, widths: &[usize]) -> String {
    let cells: Vec<String> = cells
        .zip(widths.iter())
        .map(|(cell, width)| pad_to_width(&cell, *width))
        .collect();
    cells.join(COLUMN_GAP).trim_end().to_string()
}

fn pad_to_width(s: &str, width: usize) -> String {
    format!("{}{}", s, " ".repeat(width.saturating_sub(s.width())))
}

fn single_line(s: &str) -> String {
    s.chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect()
}

fn truncate_to_width(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }

    let mut result = String::new();
    let mut current_width = 0;
    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > max_width.saturating_sub(1) {
            break;
        }
        result.push(c);
        current_width += char_width;
    }
    result.push('…');
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use cuppa::model::ExpenseDraft;

    fn expense(id: &str, kind: &str, location: &str, price: &str, date: &str) -> Expense {
        Expense::with_id(id, ExpenseDraft::new(kind, location, price, date))
    }

    fn scenario() -> Vec<Expense> {
        vec![
            expense("0f8fad5b-d9cb-469f-a165-70867728950e", "Latte", "Cafe A", "150", "2024-01-01"),
            expense("7c9e6679-7425-40de-944b-e07fc1f90ae7", "Espresso, Double", "Cafe B", "100", "2024-01-02"),
        ]
    }

    #[test]
    fn test_render_empty_table() {
        assert_eq!(render_expense_table_with(&[], None, "NPR", false), "No expenses found.\n");
    }

    #[test]
    fn test_render_table_aligns_columns() {
        let records = scenario();
        let summary = Summary::from_records(&records);
        let out = render_expense_table_with(&records, Some(&summary), "NPR", false);
        let lines: Vec<&str> = out.lines().collect();

        assert!(lines[0].starts_with("ID"));
        assert!(lines[0].contains("Price (NPR)"));
        assert!(lines[1].starts_with("0f8fad5b  2024-01-01  Latte"));
        assert!(lines[2].contains("Espresso, Double"));
        let location_col = lines[0].find("Location").unwrap();
        assert_eq!(lines[1].find("Cafe A").unwrap(), location_col);
        assert_eq!(lines[2].find("Cafe B").unwrap(), location_col);
        assert_eq!(lines.last().unwrap(), &"Total: 250.00 NPR (2 expenses)");
    }

    #[test]
    fn test_render_table_with_color_includes_ansi() {
        colored::control::set_override(true);
        let out = render_expense_table_with(&scenario(), None, "NPR", true);
        assert!(out.contains("\x1b["));
    }

    #[test]
    fn test_render_details() {
        let out = render_expense_details_with(&scenario()[..1], "NPR", false);
        assert!(out.contains("ID:          0f8fad5b-d9cb-469f-a165-70867728950e"));
        assert!(out.contains("Price (NPR): 150"));
    }

    #[test]
    fn test_render_summary() {
        let summary = Summary::from_records(&scenario());
        let out = render_summary_with(&summary, "NPR", false);
        assert!(out.contains("Expenses: 2"));
        assert!(out.contains("Average:  125.00 NPR"));
        assert!(out.contains("Espresso, Double"));
    }

    #[test]
    fn test_render_config_lists_all_keys() {
        let out = render_config(&CuppaConfig::default());
        assert!(out.contains("backend = csv\n"));
        assert!(out.contains("github.owner = \n"));
    }

    #[test]
    fn test_render_messages_plain() {
        let out = render_messages_with(
            &[CmdMessage::success("done"), CmdMessage::error("bad")],
            false,
        );
        assert_eq!(out, "done\nbad\n");
    }

    #[test]
    fn test_truncate_to_width() {
        assert_eq!(truncate_to_width("short", 10), "short");
        assert_eq!(truncate_to_width("abcdefghij", 5), "abcd…");
        assert_eq!(truncate_to_width("日本語テキスト", 5), "日本…");
    }
}
