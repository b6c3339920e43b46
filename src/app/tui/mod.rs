mod actions;
mod render;
mod session;

use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::widgets::TableState;

use novelmark::catalog::Catalog;
use novelmark::db::SqliteStore;
use novelmark::debounce::{Debouncer, OneShot, SCROLL_RESTORE_DELAY, SCROLL_SAVE_DEBOUNCE};
use novelmark::prefs::{FONT_SIZE_STEP, Preferences, Theme};
use novelmark::progress::{ContinueReadingEntry, ProgressRecord, ReadingProgressStore};
use novelmark::reader::{scroll_offset, scroll_percent, wrap_text};
use novelmark::store::KeyValueStore;

pub(super) use self::actions::{leave_chapter, open_chapter, tick_reader};
use self::actions::{
    change_font_size, refresh_library, selected_target, status_error, status_info,
};
use self::render::{draw_library, draw_reader};
use self::session::TuiSession;

const IDLE_POLL: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Focus {
    Continue,
    Library,
}

impl Focus {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Continue => "CONTINUE",
            Self::Library => "LIBRARY",
        }
    }

    pub(crate) fn toggled(self) -> Self {
        match self {
            Self::Continue => Self::Library,
            Self::Library => Self::Continue,
        }
    }
}

/// Store handles and catalog shared by every TUI action.
pub(crate) struct TuiContext<'a, S: KeyValueStore> {
    pub(crate) progress: ReadingProgressStore<&'a S>,
    pub(crate) prefs: Preferences<&'a S>,
    pub(crate) catalog: &'a Catalog,
    pub(crate) content_dir: &'a Path,
}

impl<'a, S: KeyValueStore> TuiContext<'a, S> {
    pub(crate) fn new(store: &'a S, catalog: &'a Catalog, content_dir: &'a Path) -> Self {
        Self {
            progress: ReadingProgressStore::new(store),
            prefs: Preferences::new(store),
            catalog,
            content_dir,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Appearance {
    pub(crate) theme: Theme,
    pub(crate) font_size: f64,
}

pub(crate) struct LibraryState {
    pub(crate) query: String,
    pub(crate) searching: bool,
    pub(crate) focus: Focus,
    pub(crate) continue_items: Vec<ContinueReadingEntry>,
    pub(crate) continue_state: TableState,
    pub(crate) library_state: TableState,
    pub(crate) progress_by_id: HashMap<String, ProgressRecord>,
}

impl LibraryState {
    pub(crate) fn new() -> Self {
        Self {
            query: String::new(),
            searching: false,
            focus: Focus::Library,
            continue_items: Vec::new(),
            continue_state: TableState::default(),
            library_state: TableState::default(),
            progress_by_id: HashMap::new(),
        }
    }

    fn move_selection(&mut self, catalog: &Catalog, down: bool) {
        let (state, len) = match self.focus {
            Focus::Continue => (&mut self.continue_state, self.continue_items.len()),
            Focus::Library => (&mut self.library_state, catalog.search(&self.query).len()),
        };
        if len == 0 {
            state.select(None);
            return;
        }
        let next = match (state.selected(), down) {
            (None, _) => 0,
            (Some(selected), true) => (selected + 1).min(len - 1),
            (Some(selected), false) => selected.saturating_sub(1),
        };
        state.select(Some(next));
    }

    fn reset_search_selection(&mut self, catalog: &Catalog) {
        let has_results = !catalog.search(&self.query).is_empty();
        self.library_state.select(has_results.then_some(0));
    }
}

/// One open chapter: wrapped text, scroll offset and the pending timers.
pub(crate) struct ReaderState {
    pub(crate) novel_id: String,
    pub(crate) title: String,
    pub(crate) total_chapters: u32,
    pub(crate) chapter: u32,
    text: String,
    pub(crate) lines: Vec<String>,
    columns: usize,
    pub(crate) viewport: usize,
    pub(crate) offset: usize,
    pub(crate) save_debounce: Debouncer<f64>,
    pub(crate) restore: OneShot<f64>,
}

impl ReaderState {
    pub(crate) fn new(
        novel_id: &str,
        title: &str,
        total_chapters: u32,
        chapter: u32,
        text: String,
    ) -> Self {
        Self {
            novel_id: novel_id.to_string(),
            title: title.to_string(),
            total_chapters,
            chapter,
            text,
            lines: Vec::new(),
            columns: 0,
            viewport: 0,
            offset: 0,
            save_debounce: Debouncer::new(SCROLL_SAVE_DEBOUNCE),
            restore: OneShot::new(SCROLL_RESTORE_DELAY),
        }
    }

    pub(crate) fn is_laid_out(&self) -> bool {
        self.columns > 0 && self.viewport > 0
    }

    pub(crate) fn max_offset(&self) -> usize {
        self.lines.len().saturating_sub(self.viewport)
    }

    pub(crate) fn scroll_percent(&self) -> Option<f64> {
        scroll_percent(self.offset, self.lines.len(), self.viewport)
    }

    /// Re-wraps on width changes and keeps the reading position as a
    /// percentage of the page.
    pub(crate) fn relayout(&mut self, columns: usize, viewport: usize) {
        if columns == self.columns && viewport == self.viewport {
            return;
        }
        let percent = self.scroll_percent();
        if columns != self.columns {
            self.lines = wrap_text(&self.text, columns);
            self.columns = columns;
        }
        self.viewport = viewport;
        self.offset = match percent {
            Some(percent) => scroll_offset(percent, self.lines.len(), self.viewport),
            None => self.offset.min(self.max_offset()),
        };
    }

    /// Moves the view and arms the debounced save. Returns whether the offset
    /// changed.
    pub(crate) fn scroll_to(&mut self, offset: usize, now: Instant) -> bool {
        let offset = offset.min(self.max_offset());
        if offset == self.offset {
            return false;
        }
        self.offset = offset;
        if let Some(percent) = self.scroll_percent() {
            self.save_debounce.trigger(now, percent);
        }
        true
    }

    pub(crate) fn scroll_by(&mut self, delta: isize, now: Instant) -> bool {
        let target = self.offset.saturating_add_signed(delta);
        self.scroll_to(target, now)
    }

    pub(crate) fn has_previous(&self) -> bool {
        self.chapter > 1
    }

    pub(crate) fn has_next(&self) -> bool {
        self.chapter < self.total_chapters
    }

    fn next_wakeup(&self, now: Instant) -> Option<Duration> {
        [
            self.save_debounce.time_until_due(now),
            self.restore.time_until_due(now),
        ]
        .into_iter()
        .flatten()
        .min()
    }
}

pub(crate) enum Screen {
    Library,
    Reader(ReaderState),
}

fn poll_timeout(screen: &Screen, now: Instant) -> Duration {
    match screen {
        Screen::Reader(reader) => reader
            .next_wakeup(now)
            .map_or(IDLE_POLL, |wait| wait.min(IDLE_POLL)),
        Screen::Library => IDLE_POLL,
    }
}

pub(crate) fn run_tui(db: &SqliteStore, catalog: &Catalog, content_dir: &Path) -> Result<()> {
    let ctx = TuiContext::new(db, catalog, content_dir);
    let mut session = TuiSession::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))
        .context("failed to initialize terminal backend")?;
    terminal.clear()?;

    let mut appearance = Appearance {
        theme: ctx.prefs.theme()?,
        font_size: ctx.prefs.font_size()?,
    };
    let mut library = LibraryState::new();
    refresh_library(&ctx, &mut library)?;
    library.reset_search_selection(catalog);
    if !library.continue_items.is_empty() {
        library.focus = Focus::Continue;
        library.continue_state.select(Some(0));
    }
    let mut screen = Screen::Library;
    let mut status = if catalog.is_empty() {
        status_info("The catalog is empty. Pass --catalog <novels.json> to load one.")
    } else {
        status_info("Ready.")
    };

    loop {
        if let Screen::Reader(reader) = &mut screen
            && let Err(err) = tick_reader(&ctx.progress, reader, Instant::now())
        {
            status = status_error(&format!("Saving scroll position failed: {err}"));
        }

        terminal.draw(|frame| match &mut screen {
            Screen::Library => draw_library(frame, catalog, &mut library, appearance, &status),
            Screen::Reader(reader) => draw_reader(frame, reader, appearance, &status),
        })?;

        if !event::poll(poll_timeout(&screen, Instant::now()))? {
            continue;
        }

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        let now = Instant::now();

        let mut next_screen = None::<Screen>;
        match &mut screen {
            Screen::Library if library.searching => {
                match key.code {
                    KeyCode::Char(c) => library.query.push(c),
                    KeyCode::Backspace => {
                        library.query.pop();
                    }
                    KeyCode::Enter => {
                        library.searching = false;
                        let hits = catalog.search(&library.query).len();
                        status = if hits == 0 {
                            status_info(&format!(
                                "No novels found matching \"{}\"",
                                library.query.trim().to_lowercase()
                            ))
                        } else {
                            status_info(&format!("{hits} novels shown."))
                        };
                    }
                    KeyCode::Esc => {
                        library.query.clear();
                        library.searching = false;
                        status = status_info("Search cleared.");
                    }
                    _ => {}
                }
                library.reset_search_selection(catalog);
            }
            Screen::Library => match key.code {
                KeyCode::Char('q') => break,
                KeyCode::Char('/') => {
                    library.searching = true;
                    library.focus = Focus::Library;
                    status = status_info("Type to search titles, authors and genres.");
                }
                KeyCode::Tab => library.focus = library.focus.toggled(),
                KeyCode::Up => library.move_selection(catalog, false),
                KeyCode::Down => library.move_selection(catalog, true),
                KeyCode::Char('t') => match ctx.prefs.toggle_theme() {
                    Ok(theme) => {
                        appearance.theme = theme;
                        status = status_info(&format!("Theme: {theme}"));
                    }
                    Err(err) => status = status_error(&format!("Theme change failed: {err}")),
                },
                KeyCode::Enter => {
                    let Some((novel, chapter)) = selected_target(&ctx, &library) else {
                        status = status_error("Nothing selected.");
                        continue;
                    };
                    match open_chapter(&ctx, novel, chapter, now) {
                        Ok(reader) => {
                            status = status_info(&format!(
                                "Reading {} chapter {chapter}.",
                                novel.title
                            ));
                            next_screen = Some(Screen::Reader(reader));
                        }
                        Err(err) => status = status_error(&format!("Open failed: {err}")),
                    }
                }
                _ => {}
            },
            Screen::Reader(reader) => match key.code {
                KeyCode::Esc | KeyCode::Char('q') => {
                    if let Err(err) = leave_chapter(&ctx.progress, reader) {
                        status = status_error(&format!("Saving scroll position failed: {err}"));
                    }
                    refresh_library(&ctx, &mut library)?;
                    next_screen = Some(Screen::Library);
                }
                KeyCode::Left | KeyCode::Right => {
                    let forward = key.code == KeyCode::Right;
                    let target = if forward && reader.has_next() {
                        reader.chapter + 1
                    } else if !forward && reader.has_previous() {
                        reader.chapter - 1
                    } else {
                        status = status_info(if forward {
                            "No next chapter."
                        } else {
                            "No previous chapter."
                        });
                        continue;
                    };
                    if let Err(err) = leave_chapter(&ctx.progress, reader) {
                        log::warn!("scroll flush failed for {}: {err}", reader.novel_id);
                    }
                    let Some(novel) = catalog.get(&reader.novel_id) else {
                        status = status_error("Novel is no longer in the catalog.");
                        continue;
                    };
                    match open_chapter(&ctx, novel, target, now) {
                        Ok(next) => {
                            status = status_info(&format!("Chapter {target}."));
                            next_screen = Some(Screen::Reader(next));
                        }
                        Err(err) => status = status_error(&format!("Open failed: {err}")),
                    }
                }
                KeyCode::Up => {
                    reader.scroll_by(-1, now);
                }
                KeyCode::Down => {
                    reader.scroll_by(1, now);
                }
                KeyCode::PageUp => {
                    reader.scroll_by(-(reader.viewport as isize), now);
                }
                KeyCode::PageDown => {
                    reader.scroll_by(reader.viewport as isize, now);
                }
                KeyCode::Home => {
                    reader.scroll_to(0, now);
                }
                KeyCode::End => {
                    reader.scroll_to(reader.max_offset(), now);
                }
                KeyCode::Char('+') | KeyCode::Char('=') => {
                    status = change_font_size(&ctx, &mut appearance, Some(FONT_SIZE_STEP));
                }
                KeyCode::Char('-') => {
                    status = change_font_size(&ctx, &mut appearance, Some(-FONT_SIZE_STEP));
                }
                KeyCode::Char('0') => {
                    status = change_font_size(&ctx, &mut appearance, None);
                }
                KeyCode::Char('t') => match ctx.prefs.toggle_theme() {
                    Ok(theme) => {
                        appearance.theme = theme;
                        status = status_info(&format!("Theme: {theme}"));
                    }
                    Err(err) => status = status_error(&format!("Theme change failed: {err}")),
                },
                _ => {}
            },
        }

        if let Some(next) = next_screen {
            screen = next;
        }
    }

    terminal.show_cursor()?;
    session.leave()?;
    Ok(())
}
