use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, BorderType, Borders, Cell, Gauge, Padding, Paragraph, Row, Table, Wrap,
};

use novelmark::catalog::Catalog;
use novelmark::prefs::{Theme, format_font_size};
use novelmark::reader::text_columns;

use super::super::format::{
    build_progress_gauge, format_chapter_progress_text, format_last_read_display_tui,
    format_percent, truncate,
};
use super::{Appearance, Focus, LibraryState, ReaderState};

#[derive(Debug, Clone, Copy)]
struct Palette {
    bg: Color,
    fg: Color,
    muted: Color,
    accent: Color,
    border: Color,
    error: Color,
    info: Color,
}

impl Palette {
    fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self {
                bg: Color::Black,
                fg: Color::Rgb(230, 230, 230),
                muted: Color::Rgb(185, 195, 210),
                accent: Color::Rgb(110, 170, 255),
                border: Color::Rgb(125, 135, 150),
                error: Color::Rgb(255, 145, 120),
                info: Color::Rgb(205, 165, 255),
            },
            Theme::Light => Self {
                bg: Color::Rgb(250, 248, 242),
                fg: Color::Rgb(40, 40, 46),
                muted: Color::Rgb(100, 106, 118),
                accent: Color::Rgb(44, 95, 124),
                border: Color::Rgb(160, 165, 175),
                error: Color::Rgb(180, 50, 40),
                info: Color::Rgb(92, 74, 124),
            },
        }
    }

    fn highlight(self) -> Style {
        Style::default()
            .bg(self.accent)
            .fg(self.bg)
            .add_modifier(Modifier::BOLD)
    }

    fn heading(self) -> Style {
        Style::default()
            .fg(self.accent)
            .add_modifier(Modifier::BOLD)
    }
}

pub(super) fn draw_library(
    frame: &mut Frame,
    catalog: &Catalog,
    library: &mut LibraryState,
    appearance: Appearance,
    status: &str,
) {
    let palette = Palette::for_theme(appearance.theme);
    let bg = Block::default().style(Style::default().bg(palette.bg).fg(palette.fg));
    frame.render_widget(bg, frame.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let novels = catalog.search(&library.query);
    let header = Paragraph::new(Line::from(vec![
        Span::styled("NOVELMARK", palette.heading()),
        Span::raw("   "),
        Span::styled(
            format!("{} novels", novels.len()),
            Style::default().fg(palette.muted),
        ),
        Span::raw("   "),
        Span::styled(
            format!("{} reading", library.progress_by_id.len()),
            Style::default().fg(palette.muted),
        ),
        Span::raw("   "),
        Span::styled(library.focus.label(), Style::default().fg(palette.info)),
    ]))
    .alignment(Alignment::Center)
    .block(panel_block("Dashboard", palette, false));
    frame.render_widget(header, chunks[0]);

    let body_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(64), Constraint::Percentage(36)])
        .split(chunks[1]);
    let continue_height = library.continue_items.len().max(1) as u16 + 3;
    let list_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(continue_height), Constraint::Min(5)])
        .split(body_chunks[0]);
    let details_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(8), Constraint::Length(3)])
        .split(body_chunks[1]);

    let continue_rows: Vec<Row> = library
        .continue_items
        .iter()
        .map(|entry| {
            Row::new(vec![
                Cell::from(entry.title.clone()),
                Cell::from(format!("Ch. {}", entry.chapter)),
                Cell::from(format_last_read_display_tui(&entry.timestamp)),
            ])
        })
        .collect();
    let continue_table = Table::new(
        continue_rows,
        [
            Constraint::Percentage(55),
            Constraint::Length(12),
            Constraint::Length(16),
        ],
    )
    .header(Row::new(vec!["Continue Reading", "Chapter", "Last Read"]).style(palette.heading()))
    .block(panel_block(
        "Continue",
        palette,
        library.focus == Focus::Continue,
    ))
    .row_highlight_style(palette.highlight())
    .highlight_symbol("▸ ");
    frame.render_stateful_widget(continue_table, list_chunks[0], &mut library.continue_state);

    let library_rows: Vec<Row> = novels
        .iter()
        .map(|novel| {
            let last = library
                .progress_by_id
                .get(&novel.id)
                .map(|record| format!("Ch. {}", record.chapter))
                .unwrap_or_else(|| "-".to_string());
            Row::new(vec![
                Cell::from(novel.title.clone()),
                Cell::from(novel.chapters.to_string()),
                Cell::from(last),
                Cell::from(novel.update_time.clone()),
            ])
        })
        .collect();
    let library_table = Table::new(
        library_rows,
        [
            Constraint::Percentage(46),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(16),
        ],
    )
    .header(Row::new(vec!["Title", "Chapters", "Read", "Updated"]).style(palette.heading()))
    .block(panel_block(
        "Library",
        palette,
        library.focus == Focus::Library,
    ))
    .row_highlight_style(palette.highlight())
    .highlight_symbol("▸ ");
    frame.render_stateful_widget(library_table, list_chunks[1], &mut library.library_state);

    let selected_novel = match library.focus {
        Focus::Continue => library
            .continue_state
            .selected()
            .and_then(|idx| library.continue_items.get(idx))
            .and_then(|entry| catalog.get(&entry.novel_id)),
        Focus::Library => library
            .library_state
            .selected()
            .and_then(|idx| novels.get(idx).copied()),
    };
    let (selection_text, gauge) = match selected_novel {
        Some(novel) => {
            let record = library.progress_by_id.get(&novel.id);
            let reading = record
                .map(|record| format_chapter_progress_text(record.chapter, novel.chapters))
                .unwrap_or_else(|| "Not started".to_string());
            let last_read = record
                .map(|record| format_last_read_display_tui(&record.timestamp))
                .unwrap_or_else(|| "-".to_string());
            let genres = if novel.genres.is_empty() {
                "-".to_string()
            } else {
                novel.genres.join(", ")
            };
            let text = format!(
                "Title\n{}\n\nAuthor\n{}\n\nGenres\n{}\n\nReading\n{}\n\nLast Read\n{}\n\nLatest\n{}",
                truncate(&novel.title, 40),
                truncate(novel.author.as_deref().unwrap_or("-"), 40),
                truncate(&genres, 40),
                reading,
                last_read,
                truncate(&novel.latest_chapter, 40),
            );
            let gauge =
                record.and_then(|record| build_progress_gauge(record.chapter, novel.chapters));
            (text, gauge)
        }
        None if novels.is_empty() && !library.query.trim().is_empty() => (
            format!(
                "No novels found matching \"{}\"",
                library.query.trim().to_lowercase()
            ),
            None,
        ),
        None => ("Nothing selected.".to_string(), None),
    };
    let selection = Paragraph::new(selection_text)
        .style(Style::default().fg(palette.fg))
        .wrap(Wrap { trim: true })
        .block(panel_block("Selected", palette, false));
    frame.render_widget(selection, details_chunks[0]);
    if let Some((ratio, label)) = gauge {
        let progress = Gauge::default()
            .block(panel_block("Progress", palette, false))
            .gauge_style(
                Style::default()
                    .fg(palette.accent)
                    .bg(palette.bg)
                    .add_modifier(Modifier::BOLD),
            )
            .label(label)
            .ratio(ratio);
        frame.render_widget(progress, details_chunks[1]);
    }

    let search_line = if library.searching {
        Line::from(vec![
            Span::styled("/ ", palette.heading()),
            Span::styled(library.query.clone(), Style::default().fg(palette.fg)),
            Span::styled("▏", Style::default().fg(palette.accent)),
        ])
    } else if library.query.is_empty() {
        Line::from(Span::styled(
            "press / to search",
            Style::default().fg(palette.muted),
        ))
    } else {
        Line::from(vec![
            Span::styled("filter: ", Style::default().fg(palette.muted)),
            Span::styled(library.query.clone(), Style::default().fg(palette.fg)),
        ])
    };
    let search = Paragraph::new(search_line).block(panel_block(
        "Search",
        palette,
        library.searching,
    ));
    frame.render_widget(search, chunks[2]);

    let controls = Paragraph::new(Line::from(Span::styled(
        "↑/↓ move  Tab switch  Enter read  / search  t theme  q quit",
        Style::default().fg(palette.muted),
    )))
    .alignment(Alignment::Center)
    .block(panel_block("Controls", palette, false));
    frame.render_widget(controls, chunks[3]);

    render_status(frame, chunks[4], status, palette);
}

pub(super) fn draw_reader(
    frame: &mut Frame,
    reader: &mut ReaderState,
    appearance: Appearance,
    status: &str,
) {
    let palette = Palette::for_theme(appearance.theme);
    let bg = Block::default().style(Style::default().bg(palette.bg).fg(palette.fg));
    frame.render_widget(bg, frame.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let position = reader
        .scroll_percent()
        .map(format_percent)
        .unwrap_or_else(|| "all".to_string());
    let header = Paragraph::new(Line::from(vec![
        Span::styled(truncate(&reader.title, 40), palette.heading()),
        Span::raw("   "),
        Span::styled(
            format!("Chapter {} of {}", reader.chapter, reader.total_chapters),
            Style::default().fg(palette.fg),
        ),
        Span::raw("   "),
        Span::styled(position, Style::default().fg(palette.muted)),
        Span::raw("   "),
        Span::styled(
            format!("{}rem", format_font_size(appearance.font_size)),
            Style::default().fg(palette.muted),
        ),
    ]))
    .alignment(Alignment::Center)
    .block(panel_block("Reading", palette, false));
    frame.render_widget(header, chunks[0]);

    let page_block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(palette.border))
        .padding(Padding::horizontal(2));
    let page_area = page_block.inner(chunks[1]);
    frame.render_widget(page_block, chunks[1]);

    let columns =
        text_columns(page_area.width, appearance.font_size).min(page_area.width.max(1) as usize);
    reader.relayout(columns, page_area.height as usize);

    let visible: Vec<Line> = reader
        .lines
        .iter()
        .skip(reader.offset)
        .take(reader.viewport)
        .map(|line| Line::from(line.as_str()))
        .collect();
    let text_width = (columns as u16).min(page_area.width);
    let text_area = Rect::new(
        page_area.x + page_area.width.saturating_sub(text_width) / 2,
        page_area.y,
        text_width,
        page_area.height,
    );
    let body_style = if appearance.font_size >= 1.5 {
        Style::default().fg(palette.fg).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(palette.fg)
    };
    frame.render_widget(Paragraph::new(visible).style(body_style), text_area);

    let mut controls = Vec::new();
    if reader.has_previous() {
        controls.push("← prev");
    }
    if reader.has_next() {
        controls.push("→ next");
    }
    controls.extend(["↑/↓ PgUp/PgDn scroll", "Home/End", "+/-/0 font", "t theme", "Esc back"]);
    let controls = Paragraph::new(Line::from(Span::styled(
        controls.join("  "),
        Style::default().fg(palette.muted),
    )))
    .alignment(Alignment::Center)
    .block(panel_block("Controls", palette, false));
    frame.render_widget(controls, chunks[2]);

    render_status(frame, chunks[3], status, palette);
}

fn render_status(frame: &mut Frame, area: Rect, status: &str, palette: Palette) {
    let status_widget = Paragraph::new(status.to_string())
        .style(status_style(status, palette))
        .block(panel_block("Status", palette, false));
    frame.render_widget(status_widget, area);
}

fn panel_block(title: &'static str, palette: Palette, focused: bool) -> Block<'static> {
    let border = if focused {
        Style::default()
            .fg(palette.accent)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(palette.border)
    };
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(border)
        .title(title)
}

fn status_style(status: &str, palette: Palette) -> Style {
    if status.starts_with("ERROR:") {
        Style::default()
            .fg(palette.error)
            .add_modifier(Modifier::BOLD)
    } else if status.starts_with("INFO:") {
        Style::default().fg(palette.info)
    } else {
        Style::default().fg(palette.fg)
    }
}
