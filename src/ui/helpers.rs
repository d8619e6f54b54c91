use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::models::Person;

/// Repeat a short ASCII motif until it fills the requested width.
pub(crate) fn repeat_pattern_row(row: &str, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    if row.is_empty() {
        return " ".repeat(width);
    }
    let repeat_count = width / row.len() + 2;
    let mut repeated = row.repeat(repeat_count);
    repeated.truncate(width);
    repeated
}

/// Center `text` in a field of `width` display columns, truncating by
/// characters so multi-byte names never split mid-codepoint.
pub(crate) fn centered_label(text: &str, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return " ".repeat(width);
    }
    let mut label: String = trimmed.chars().take(width).collect();
    let len = label.chars().count();
    let padding = width.saturating_sub(len);
    let left = padding / 2;
    let right = padding - left;
    label.insert_str(0, &" ".repeat(left));
    label.push_str(&" ".repeat(right));
    label
}

/// Build the card cover for a person: a decorative pattern with the
/// fallback initial in the middle and the name underneath.
pub(crate) fn build_person_cover_lines(
    person: &Person,
    pattern: &[&str],
    inner_width: u16,
    inner_height: u16,
    selected: bool,
) -> Vec<Line<'static>> {
    let width = inner_width as usize;
    let height = inner_height as usize;
    if width == 0 || height == 0 {
        return vec![Line::from("")];
    }

    let pattern_style = if selected {
        Style::default().fg(Color::Gray)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let pattern_line = |row_idx: usize| -> Line<'static> {
        let row = if pattern.is_empty() {
            " ".repeat(width)
        } else {
            repeat_pattern_row(pattern[row_idx % pattern.len()], width)
        };
        Line::from(vec![Span::styled(row, pattern_style)])
    };

    let name_style = if selected {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let initial = format!("[ {} ]", person.fallback.trim());

    let mut lines = Vec::with_capacity(height);
    if height < 3 {
        lines.push(Line::from(Span::styled(
            centered_label(&person.name, width),
            name_style,
        )));
    } else {
        let middle = (height - 1) / 2;
        for row_idx in 0..height - 1 {
            if row_idx == middle {
                lines.push(Line::from(Span::styled(
                    centered_label(&initial, width),
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                )));
            } else {
                lines.push(pattern_line(row_idx));
            }
        }
        lines.push(Line::from(Span::styled(
            centered_label(&person.name, width),
            name_style,
        )));
    }

    while lines.len() < height {
        lines.push(pattern_line(lines.len()));
    }
    lines
}

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_label_pads_by_characters() {
        assert_eq!(centered_label("ab", 6), "  ab  ");
        assert_eq!(centered_label("خالد", 6).chars().count(), 6);
        assert_eq!(centered_label("abcdef", 3), "abc");
        assert_eq!(centered_label("   ", 2), "  ");
    }

    #[test]
    fn pattern_rows_fill_the_width() {
        assert_eq!(repeat_pattern_row("ab", 5), "ababa");
        assert_eq!(repeat_pattern_row("", 3), "   ");
        assert_eq!(repeat_pattern_row("ab", 0), "");
    }

    #[test]
    fn surfaces_the_root_cause() {
        let err = anyhow::anyhow!("Person not found").context("failed to update person");
        assert_eq!(surface_error(&err), "Person not found");
    }
}
