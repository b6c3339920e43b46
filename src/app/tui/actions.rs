use std::time::Instant;

use anyhow::Result;
use chrono::Utc;

use novelmark::catalog::Novel;
use novelmark::progress::{DEFAULT_CONTINUE_LIMIT, ReadingProgressStore};
use novelmark::reader::{load_chapter_text, placeholder_text, scroll_offset};
use novelmark::store::KeyValueStore;

use super::{Appearance, Focus, LibraryState, ReaderState, TuiContext};

pub(crate) fn refresh_library<S: KeyValueStore>(
    ctx: &TuiContext<'_, S>,
    library: &mut LibraryState,
) -> Result<()> {
    library.continue_items = ctx
        .progress
        .continue_reading(ctx.catalog, DEFAULT_CONTINUE_LIMIT)?;
    library.progress_by_id = ctx
        .progress
        .list_all_progress()?
        .into_iter()
        .map(|record| (record.novel_id.clone(), record))
        .collect();

    if library.continue_items.is_empty() {
        library.continue_state.select(None);
        if library.focus == Focus::Continue {
            library.focus = Focus::Library;
        }
    } else {
        let last = library.continue_items.len() - 1;
        let selected = library.continue_state.selected().map_or(0, |idx| idx.min(last));
        library.continue_state.select(Some(selected));
    }
    Ok(())
}

/// Novel and chapter that `Enter` opens for the focused table.
pub(crate) fn selected_target<'a, S: KeyValueStore>(
    ctx: &TuiContext<'a, S>,
    library: &LibraryState,
) -> Option<(&'a Novel, u32)> {
    match library.focus {
        Focus::Continue => {
            let entry = library
                .continue_items
                .get(library.continue_state.selected()?)?;
            let novel = ctx.catalog.get(&entry.novel_id)?;
            Some((novel, entry.chapter))
        }
        Focus::Library => {
            let novel = *ctx
                .catalog
                .search(&library.query)
                .get(library.library_state.selected()?)?;
            let chapter = library
                .progress_by_id
                .get(&novel.id)
                .map_or(1, |record| record.chapter);
            Some((novel, chapter))
        }
    }
}

/// Records the visit and queues the saved scroll position for restore once
/// the page has been laid out.
pub(crate) fn open_chapter<S: KeyValueStore>(
    ctx: &TuiContext<'_, S>,
    novel: &Novel,
    chapter: u32,
    now: Instant,
) -> Result<ReaderState> {
    ctx.progress.save_progress(&novel.id, chapter, Utc::now())?;

    let text = match load_chapter_text(ctx.content_dir, &novel.id, chapter) {
        Ok(Some(text)) => text,
        Ok(None) => placeholder_text(&novel.title, chapter),
        Err(err) => {
            log::warn!("{err:#}");
            placeholder_text(&novel.title, chapter)
        }
    };

    let mut reader = ReaderState::new(&novel.id, &novel.title, novel.chapters, chapter, text);
    if let Some(percent) = ctx.progress.load_scroll(&novel.id, chapter)? {
        reader.restore.schedule(now, percent);
    }
    Ok(reader)
}

/// Runs whichever reader timers are due.
pub(crate) fn tick_reader<S: KeyValueStore>(
    progress: &ReadingProgressStore<S>,
    reader: &mut ReaderState,
    now: Instant,
) -> Result<()> {
    if let Some(percent) = reader.save_debounce.fire_if_due(now) {
        progress.save_scroll(&reader.novel_id, reader.chapter, percent)?;
    }
    if reader.is_laid_out()
        && let Some(percent) = reader.restore.take_if_due(now)
    {
        reader.offset = scroll_offset(percent, reader.lines.len(), reader.viewport);
    }
    Ok(())
}

/// Writes a scroll position that is still waiting out its debounce.
pub(crate) fn leave_chapter<S: KeyValueStore>(
    progress: &ReadingProgressStore<S>,
    reader: &mut ReaderState,
) -> Result<()> {
    if let Some(percent) = reader.save_debounce.flush() {
        progress.save_scroll(&reader.novel_id, reader.chapter, percent)?;
    }
    Ok(())
}

/// `None` resets to the default size.
pub(crate) fn change_font_size<S: KeyValueStore>(
    ctx: &TuiContext<'_, S>,
    appearance: &mut Appearance,
    delta: Option<f64>,
) -> String {
    let result = match delta {
        Some(delta) => ctx.prefs.adjust_font_size(delta),
        None => ctx.prefs.reset_font_size(),
    };
    match result {
        Ok(size) => {
            appearance.font_size = size;
            status_info(&format!("Font size {size:.1}rem"))
        }
        Err(err) => status_error(&format!("Font size change failed: {err}")),
    }
}

pub(crate) fn status_info(msg: &str) -> String {
    format!("INFO: {msg}")
}

pub(crate) fn status_error(msg: &str) -> String {
    format!("ERROR: {msg}")
}
