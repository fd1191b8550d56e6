//! UI rendering functions for the TUI.
//!
//! Lays out the file input, the tag filter list, the chart, the record table
//! and a status bar using ratatui widgets.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Bar, BarChart, BarGroup, Block, Borders, List, ListItem, ListState, Paragraph, Row, Table,
        TableState,
    },
};

use super::app::{App, Focus};
use crate::chart::{ChartSeries, HslColor};
use crate::models::ChartKind;
use crate::session::PROCESSING_MESSAGE;

const ABSTRACT_PREVIEW_CHARS: usize = 80;

/// Main rendering function for the TUI.
pub fn draw(frame: &mut Frame, app: &App) {
    let size = frame.area();

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),      // File input
            Constraint::Percentage(50), // Filter list and chart
            Constraint::Min(0),         // Records
            Constraint::Length(1),      // Status bar
        ])
        .split(size);

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(main_chunks[1]);

    render_file_input(frame, app, main_chunks[0]);
    render_tag_list(frame, app, content_chunks[0]);
    render_chart(frame, &app.session().chart_series(), content_chunks[1]);
    render_records(frame, app, main_chunks[2]);
    render_status_bar(frame, app, main_chunks[3]);
}

fn panel(title: &str, focused: bool) -> Block<'_> {
    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(border_style)
}

fn color_of(color: HslColor) -> Color {
    let (r, g, b) = color.to_rgb();
    Color::Rgb(r, g, b)
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}

fn render_file_input(frame: &mut Frame, app: &App, area: Rect) {
    let is_focused = app.focus() == Focus::FileInput;

    let mut content = app.file_input().to_string();
    if is_focused {
        content.push('█');
    }

    let paragraph = Paragraph::new(content).block(panel("CSV file (Enter to predict)", is_focused));
    frame.render_widget(paragraph, area);
}

/// Filter list: "All" with the record count, then each tag as `label: value`.
fn render_tag_list(frame: &mut Frame, app: &App, area: Rect) {
    let table = app.session().frequency_table();
    let total = app.session().results().len();

    let items: Vec<ListItem> = app
        .filter_labels()
        .into_iter()
        .enumerate()
        .map(|(i, label)| {
            if i == 0 {
                ListItem::new(format!("{label} ({total})"))
            } else {
                let count = table.get(&label).unwrap_or(0);
                ListItem::new(Line::from(vec![
                    Span::styled("■ ", Style::default().fg(color_of(HslColor::for_index(i - 1)))),
                    Span::raw(format!("{label}: {count}")),
                ]))
            }
        })
        .collect();

    let list = List::new(items)
        .block(panel("Filter by tag", app.focus() == Focus::TagList))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    let mut state = ListState::default();
    state.select(app.selected_filter_index());

    frame.render_stateful_widget(list, area, &mut state);
}

fn render_chart(frame: &mut Frame, series: &ChartSeries, area: Rect) {
    let title = format!("{} ({})", series.title(), series.kind());
    let block = panel(&title, false);

    if series.is_empty() {
        frame.render_widget(Paragraph::new("No predictions yet").block(block), area);
        return;
    }

    match series.kind() {
        ChartKind::Bar => render_bar_chart(frame, series, block, area),
        ChartKind::Pie => render_share_chart(frame, series, block, area),
    }
}

fn render_bar_chart(frame: &mut Frame, series: &ChartSeries, block: Block, area: Rect) {
    let bars: Vec<Bar> = series
        .points()
        .iter()
        .map(|point| {
            Bar::default()
                .value(point.value as u64)
                .label(Line::from(point.label.clone()))
                .style(Style::default().fg(color_of(point.color)))
        })
        .collect();

    let inner_width = area.width.saturating_sub(2) as usize;
    let slot = (inner_width / series.len().max(1)).max(2);
    let bar_width = u16::try_from(slot - 1).unwrap_or(u16::MAX).clamp(1, 9);

    let mut chart = BarChart::default()
        .block(block)
        .data(BarGroup::default().bars(&bars))
        .bar_width(bar_width)
        .bar_gap(1);
    if let Some((_, max)) = series.value_range() {
        chart = chart.max(max as u64);
    }

    frame.render_widget(chart, area);
}

/// Pie kind: one legend line per tag with a share bar.
fn render_share_chart(frame: &mut Frame, series: &ChartSeries, block: Block, area: Rect) {
    let label_width = series
        .points()
        .iter()
        .map(|p| p.label.chars().count())
        .max()
        .unwrap_or(0)
        .min(24);
    let bar_room = (area.width as usize).saturating_sub(label_width + 18).max(1);

    let lines: Vec<Line> = series
        .points()
        .iter()
        .enumerate()
        .map(|(i, point)| {
            let share = series.share(i);
            let filled = (share * bar_room as f64).round() as usize;
            let color = Style::default().fg(color_of(point.color));

            Line::from(vec![
                Span::styled("■ ", color),
                Span::raw(format!(
                    "{:<width$} ",
                    preview(&point.label, label_width),
                    width = label_width
                )),
                Span::styled("█".repeat(filled), color),
                Span::styled(
                    format!(" {} ({:.1}%)", point.value, share * 100.0),
                    Style::default().fg(Color::DarkGray),
                ),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_records(frame: &mut Frame, app: &App, area: Rect) {
    let records = app.filtered_records();
    let title = format!("Records ({})", records.len());

    let rows: Vec<Row> = records
        .iter()
        .map(|record| {
            Row::new(vec![
                preview(record.abstract_text(), ABSTRACT_PREVIEW_CHARS),
                record.joined_tags(),
            ])
        })
        .collect();

    let header = Row::new(vec!["Abstract", "Predicted Tags"])
        .style(Style::default().add_modifier(Modifier::BOLD));

    let table = Table::new(rows, [Constraint::Percentage(70), Constraint::Percentage(30)])
        .header(header)
        .block(panel(&title, app.focus() == Focus::Records))
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    let mut state = TableState::default();
    state.select(app.selected_record());

    frame.render_stateful_widget(table, area, &mut state);
}

/// Status bar: loading indicator or the last notice, then the shortcuts.
fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let key_style = Style::default().fg(Color::Cyan);
    let sep_style = Style::default().fg(Color::DarkGray);

    let mut spans = Vec::new();
    if app.session().is_loading() {
        spans.push(Span::styled(PROCESSING_MESSAGE, Style::default().fg(Color::Yellow)));
        spans.push(Span::styled(" | ", sep_style));
    } else if let Some(notice) = app.session().notice() {
        let color = if notice.is_error() {
            Color::Red
        } else {
            Color::Green
        };
        spans.push(Span::styled(notice.message().to_string(), Style::default().fg(color)));
        spans.push(Span::styled(" | ", sep_style));
    }

    let shortcuts: &[(&str, &str)] = match app.focus() {
        Focus::FileInput => &[("Enter", "predict"), ("Tab", "next panel"), ("Ctrl+C", "quit")],
        Focus::TagList | Focus::Records => &[
            ("j/k", "navigate"),
            ("c", "bar/pie"),
            ("e", "csv"),
            ("p", "pdf"),
            ("Esc", "input"),
            ("q", "quit"),
        ],
    };
    for (i, (key, action)) in shortcuts.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", sep_style));
        }
        spans.push(Span::styled(*key, key_style));
        spans.push(Span::raw(format!(": {action}")));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
