//! Content tree panel: the focal entity and its subsumed sub-entities,
//! indented by depth, with expansion markers and lazy-load placeholders.

use curator_core::tree::TreeRow;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};

fn marker(row: &TreeRow) -> &'static str {
    if !row.loaded {
        return "…";
    }
    if !row.has_children {
        return "·";
    }
    if row.expanded { "▾" } else { "▸" }
}

/// Build one tree line: indent, marker, name, then the id subdued.
/// Placeholder rows already show the id as their name, so they skip
/// the trailing id span.
fn row_line(row: &TreeRow, selected: bool) -> Line<'static> {
    let mut name_style = if row.is_focus {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else if !row.loaded {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::White)
    };
    let mut id_style = Style::default().fg(Color::DarkGray);
    if selected {
        name_style = name_style.bg(Color::DarkGray).add_modifier(Modifier::BOLD);
        id_style = id_style.bg(Color::DarkGray);
    }

    let mut spans = vec![Span::styled(
        format!("{}{} {}", "  ".repeat(row.depth), marker(row), row.name),
        name_style,
    )];
    if row.loaded {
        spans.push(Span::styled(format!("  [{}]", row.id), id_style));
    }
    Line::from(spans)
}

pub fn render_tree(
    f: &mut Frame,
    area: Rect,
    rows: &[TreeRow],
    cursor: Option<usize>,
    border: Style,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Content ({}) ", rows.len()))
        .border_style(border);
    let inner = block.inner(area);
    f.render_widget(block, area);

    if rows.is_empty() {
        let empty = Paragraph::new("Nothing loaded yet")
            .style(Style::default().fg(Color::DarkGray))
            .wrap(Wrap { trim: true });
        f.render_widget(empty, inner);
        return;
    }

    // Keep the cursor row in view.
    let height = inner.height as usize;
    let scroll = match cursor {
        Some(c) if c >= height && height > 0 => c + 1 - height,
        _ => 0,
    };

    let items: Vec<ListItem> = rows
        .iter()
        .enumerate()
        .skip(scroll)
        .take(height)
        .map(|(idx, row)| ListItem::new(row_line(row, cursor == Some(idx))))
        .collect();

    f.render_widget(List::new(items), inner);
}
