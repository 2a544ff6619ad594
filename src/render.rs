//! Plain-text rendering of a list page for the command line

use scraper::Html;
use serde_json::Value;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::flash::Flash;
use crate::table::ItemRange;

/// Configuration for table display
#[derive(Debug, Clone)]
pub struct TableConfig {
    pub max_column_width: usize,
    pub show_header: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            max_column_width: 24,
            show_header: true,
        }
    }
}

/// Columns to show: the requested ones, or the keys of the first row
pub fn columns_for(rows: &[Value], requested: &[String]) -> Vec<String> {
    if !requested.is_empty() {
        return requested.to_vec();
    }
    match rows.first() {
        Some(Value::Object(map)) => map.keys().cloned().collect(),
        _ => vec!["value".to_string()],
    }
}

pub fn render_table(rows: &[Value], columns: &[String], config: &TableConfig) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|column| truncate(&cell_text(row, column), config.max_column_width))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            let header = if config.show_header {
                truncate(column, config.max_column_width).width()
            } else {
                0
            };
            cells
                .iter()
                .map(|row| row[i].width())
                .max()
                .unwrap_or(0)
                .max(header)
        })
        .collect();

    let mut lines = Vec::new();
    if config.show_header {
        let header: Vec<String> = columns
            .iter()
            .map(|c| truncate(c, config.max_column_width))
            .collect();
        lines.push(join_row(&header, &widths));
        lines.push(
            widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("-+-"),
        );
    }
    for row in &cells {
        lines.push(join_row(row, &widths));
    }

    lines.join("\n")
}

/// Page shortcuts with the current page bracketed, e.g. `[4] 5 6 7`
pub fn render_page_window(window: &[u32], current_page: u32) -> String {
    window
        .iter()
        .map(|page| {
            if *page == current_page {
                format!("[{}]", page)
            } else {
                page.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn render_summary(range: &ItemRange, current_page: u32, total_pages: u32) -> String {
    format!("{} (page {}/{})", range, current_page, total_pages.max(1))
}

pub fn render_flash(flash: &Flash) -> String {
    let prefix = match flash.kind {
        crate::flash::FlashKind::Info => "ℹ",
        crate::flash::FlashKind::Success => "✓",
        crate::flash::FlashKind::Warning => "⚠",
        crate::flash::FlashKind::Error => "✗",
    };
    format!("{} {}", prefix, plain_text(&flash.message))
}

fn cell_text(row: &Value, column: &str) -> String {
    let value = match row {
        Value::Object(map) => map.get(column).unwrap_or(&Value::Null),
        other => other,
    };
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn join_row(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let padding = width.saturating_sub(cell.width());
            format!("{}{}", cell, " ".repeat(padding))
        })
        .collect::<Vec<_>>()
        .join(" | ")
        .trim_end()
        .to_string()
}

/// Cut `text` to at most `max` display columns, marking the cut with `…`
fn truncate(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }

    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

/// Visible text of an HTML fragment, entities decoded
fn plain_text(html: &str) -> String {
    Html::parse_fragment(html).root_element().text().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_table_aligns_columns() {
        let rows = vec![
            json!({"id": 1, "name": "Widget"}),
            json!({"id": 20, "name": null}),
        ];
        let columns = vec!["id".to_string(), "name".to_string()];
        let table = render_table(&rows, &columns, &TableConfig::default());

        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines[0], "id | name");
        assert_eq!(lines[1], "---+-------");
        assert_eq!(lines[2], "1  | Widget");
        assert_eq!(lines[3], "20 |");
    }

    #[test]
    fn test_truncate_respects_display_width() {
        assert_eq!(truncate("abcdef", 4), "abc…");
        assert_eq!(truncate("日本語テキスト", 5), "日本…");
        assert_eq!(truncate("short", 10), "short");
    }

    #[test]
    fn test_columns_default_to_first_row_keys() {
        let rows = vec![json!({"a": 1, "b": 2})];
        assert_eq!(columns_for(&rows, &[]), vec!["a", "b"]);
        assert_eq!(columns_for(&rows, &["b".to_string()]), vec!["b"]);
        assert_eq!(columns_for(&[], &[]), vec!["value"]);
    }

    #[test]
    fn test_page_window_marks_current() {
        assert_eq!(render_page_window(&[4, 5, 6, 7], 4), "[4] 5 6 7");
    }

    #[test]
    fn test_flash_strips_markup() {
        let flash = Flash::error(
            "Something went wrong, please contact <a href=\"mailto:x@y.z\">x@y.z</a>",
        );
        assert_eq!(render_flash(&flash), "✗ Something went wrong, please contact x@y.z");
    }

    #[test]
    fn test_flash_decodes_entities() {
        let flash = Flash::error("Tom &amp; Jerry <b>bold</b>");
        assert_eq!(render_flash(&flash), "✗ Tom & Jerry bold");

        let plain = Flash::info("3 &lt; 4");
        assert_eq!(render_flash(&plain), "ℹ 3 < 4");
    }
}
