use std::io::{BufRead, Write};

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::platform::types::Issue;

const TITLE_WIDTH: usize = 50;
const MAX_LABELS: usize = 3;
const BODY_PREVIEW_CHARS: usize = 200;

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

fn preview(body: &str) -> String {
    match body.char_indices().nth(BODY_PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

fn labels_cell(labels: &[String]) -> String {
    let mut cell = labels
        .iter()
        .take(MAX_LABELS)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");
    if labels.len() > MAX_LABELS {
        cell.push_str("...");
    }
    cell
}

fn age_cell(created_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    match created_at {
        Some(created) => format!("{}d", (now - created).num_days()),
        None => "-".to_string(),
    }
}

/// Print the issue table.
pub fn render_table<W: Write>(issues: &[Issue], now: DateTime<Utc>, out: &mut W) -> Result<()> {
    writeln!(out, "Open GitHub Issues")?;
    writeln!(
        out,
        "{:<6} {:<width$} {:<20} {:<6}",
        "#",
        "Title",
        "Labels",
        "Age",
        width = TITLE_WIDTH
    )?;
    for (i, issue) in issues.iter().enumerate() {
        writeln!(
            out,
            "{:<6} {:<width$} {:<20} {:<6}",
            i + 1,
            truncate(&issue.title, TITLE_WIDTH),
            labels_cell(&issue.labels),
            age_cell(issue.created_at, now),
            width = TITLE_WIDTH
        )?;
    }
    Ok(())
}

fn ask<R: BufRead, W: Write>(
    question: &str,
    default: &str,
    input: &mut R,
    out: &mut W,
) -> Result<Option<String>> {
    write!(out, "{question} [{default}]: ")?;
    out.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let answer = line.trim();
    if answer.is_empty() {
        Ok(Some(default.to_string()))
    } else {
        Ok(Some(answer.to_string()))
    }
}

/// Let the user pick an issue interactively.
///
/// Returns `None` when the user quits or input ends.
pub fn select_issue<R: BufRead, W: Write>(
    issues: &[Issue],
    now: DateTime<Utc>,
    input: &mut R,
    out: &mut W,
) -> Result<Option<Issue>> {
    if issues.is_empty() {
        return Ok(None);
    }

    render_table(issues, now, out)?;

    loop {
        let question = format!("\nSelect an issue (1-{}) or 'q' to quit", issues.len());
        let Some(choice) = ask(&question, "1", input, out)? else {
            return Ok(None);
        };

        if choice.eq_ignore_ascii_case("q") {
            return Ok(None);
        }

        let index = match choice.parse::<usize>() {
            Ok(n) if (1..=issues.len()).contains(&n) => n - 1,
            Ok(_) => {
                writeln!(out, "Invalid selection. Please try again.")?;
                continue;
            }
            Err(_) => {
                writeln!(out, "Invalid input. Please enter a number or 'q'.")?;
                continue;
            }
        };

        let selected = &issues[index];
        writeln!(out, "\nIssue #{}: {}", selected.number, selected.title)?;
        if !selected.body.is_empty() {
            writeln!(out, "{}", preview(&selected.body))?;
        }

        let Some(confirm) = ask("\nWork on this issue? (y/n)", "y", input, out)? else {
            return Ok(None);
        };
        if matches!(confirm.to_lowercase().as_str(), "y" | "yes") {
            return Ok(Some(selected.clone()));
        }
    }
}

/// Find an issue by number, for non-interactive runs.
pub fn find_issue(issues: &[Issue], number: u64) -> Option<Issue> {
    issues.iter().find(|issue| issue.number == number).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::io::Cursor;

    fn issue(number: u64, title: &str, labels: &[&str], age_days: i64, now: DateTime<Utc>) -> Issue {
        Issue {
            number,
            title: title.to_string(),
            body: format!("Body of {number}"),
            labels: labels.iter().map(|l| l.to_string()).collect(),
            created_at: Some(now - Duration::days(age_days)),
            url: String::new(),
        }
    }

    fn run(issues: &[Issue], now: DateTime<Utc>, input: &str) -> (Option<Issue>, String) {
        let mut input = Cursor::new(input.as_bytes().to_vec());
        let mut out = Vec::new();
        let picked = select_issue(issues, now, &mut input, &mut out).unwrap();
        (picked, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_table_rows() {
        let now = Utc::now();
        let issues = vec![issue(12, "Crash on start", &["bug", "p1", "ui", "core"], 3, now)];
        let mut out = Vec::new();
        render_table(&issues, now, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Crash on start"));
        assert!(text.contains("bug, p1, ui..."));
        assert!(text.contains("3d"));
    }

    #[test]
    fn test_long_title_truncated() {
        assert_eq!(truncate(&"x".repeat(60), 50), format!("{}...", "x".repeat(47)));
        assert_eq!(truncate("short", 50), "short");
    }

    #[test]
    fn test_default_selection_and_confirm() {
        let now = Utc::now();
        let issues = vec![issue(5, "First", &[], 1, now), issue(9, "Second", &[], 2, now)];
        let (picked, _) = run(&issues, now, "\n\n");
        assert_eq!(picked.unwrap().number, 5);
    }

    #[test]
    fn test_pick_second_after_invalid_input() {
        let now = Utc::now();
        let issues = vec![issue(5, "First", &[], 1, now), issue(9, "Second", &[], 2, now)];
        let (picked, out) = run(&issues, now, "abc\n7\n2\nyes\n");
        assert_eq!(picked.unwrap().number, 9);
        assert!(out.contains("Invalid input"));
        assert!(out.contains("Invalid selection"));
        assert!(out.contains("Issue #9: Second"));
    }

    #[test]
    fn test_declined_then_quit() {
        let now = Utc::now();
        let issues = vec![issue(5, "First", &[], 1, now)];
        let (picked, _) = run(&issues, now, "1\nn\nq\n");
        assert!(picked.is_none());
    }

    #[test]
    fn test_eof_returns_none() {
        let now = Utc::now();
        let issues = vec![issue(5, "First", &[], 1, now)];
        let (picked, _) = run(&issues, now, "");
        assert!(picked.is_none());
    }

    #[test]
    fn test_find_issue() {
        let now = Utc::now();
        let issues = vec![issue(5, "First", &[], 1, now), issue(9, "Second", &[], 2, now)];
        assert_eq!(find_issue(&issues, 9).unwrap().title, "Second");
        assert!(find_issue(&issues, 10).is_none());
    }
}
