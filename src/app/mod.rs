mod format;
mod tui;

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use chrono::Utc;

use novelmark::catalog::{Catalog, SortOrder};
use crate::cli::{Cli, Command, FontAction, ThemeAction};
use novelmark::db::SqliteStore;
use crate::paths::{catalog_file_path, database_file_path};
use novelmark::prefs::{FONT_SIZE_STEP, Preferences, Theme, format_font_size};
use novelmark::progress::ReadingProgressStore;
use novelmark::store::KeyValueStore;

use self::format::{format_last_read_display, format_percent, normalize_query, truncate};

pub fn run(cli: Cli) -> Result<()> {
    let db = open_db()?;
    let (catalog, content_dir) = open_catalog(cli.catalog.as_deref())?;

    match cli.command {
        Some(Command::Read { novel, chapter }) => run_read(&db, &catalog, &novel, chapter)?,
        Some(Command::Scroll {
            novel,
            chapter,
            percent,
        }) => run_scroll(&db, &novel, chapter, percent)?,
        Some(Command::List) => run_list(&db, &catalog)?,
        Some(Command::Continue { limit }) => run_continue(&db, &catalog, limit)?,
        Some(Command::Search { query }) => run_search(&catalog, &query),
        Some(Command::Latest) => run_latest(&catalog),
        Some(Command::Chapters { novel, desc }) => run_chapters(&db, &catalog, &novel, desc)?,
        Some(Command::Theme { action }) => run_theme(&db, action)?,
        Some(Command::Font { action }) => run_font(&db, action)?,
        Some(Command::Tui) | None => tui::run_tui(&db, &catalog, &content_dir)?,
    }

    Ok(())
}

fn run_read<S: KeyValueStore>(
    store: &S,
    catalog: &Catalog,
    novel_id: &str,
    chapter: u32,
) -> Result<()> {
    let progress = ReadingProgressStore::new(store);
    if !progress.save_progress(novel_id, chapter, Utc::now())? {
        println!("Nothing saved: a novel id and a chapter of 1 or more are required.");
        return Ok(());
    }
    match catalog.get(novel_id) {
        Some(novel) => {
            println!("Saved progress: {} -> chapter {chapter}", novel.title);
            if !novel.has_chapter(chapter) {
                println!(
                    "Note: the catalog lists {} chapters for this novel.",
                    novel.chapters
                );
            }
        }
        None => {
            println!("Saved progress: {novel_id} -> chapter {chapter}");
            println!(
                "Note: {novel_id} is not in the catalog and will not show in continue reading."
            );
        }
    }
    Ok(())
}

fn run_scroll<S: KeyValueStore>(
    store: &S,
    novel_id: &str,
    chapter: u32,
    percent: Option<f64>,
) -> Result<()> {
    let progress = ReadingProgressStore::new(store);
    match percent {
        Some(percent) => {
            if progress.save_scroll(novel_id, chapter, percent)? {
                println!(
                    "Saved scroll position for {novel_id} chapter {chapter}: {}",
                    format_percent(percent)
                );
            } else {
                println!("Nothing saved: a novel id and a chapter of 1 or more are required.");
            }
        }
        None => match progress.load_scroll(novel_id, chapter)? {
            Some(percent) => println!(
                "{novel_id} chapter {chapter}: {}",
                format_percent(percent)
            ),
            None => println!("No saved scroll position for {novel_id} chapter {chapter}."),
        },
    }
    Ok(())
}

fn run_list<S: KeyValueStore>(store: &S, catalog: &Catalog) -> Result<()> {
    let records = ReadingProgressStore::new(store).list_all_progress()?;
    if records.is_empty() {
        println!("No reading progress yet. Run `novelmark read <novel> <chapter>` first.");
        return Ok(());
    }

    println!(
        "{:<24} {:<36} {:<8} {:<28}",
        "NOVEL ID", "TITLE", "CH", "LAST READ"
    );
    for record in records {
        let title = catalog
            .get(&record.novel_id)
            .map(|novel| novel.title.as_str())
            .unwrap_or("-");
        println!(
            "{:<24} {:<36} {:<8} {:<28}",
            truncate(&record.novel_id, 24),
            truncate(title, 36),
            record.chapter,
            format_last_read_display(&record.timestamp)
        );
    }
    Ok(())
}

fn run_continue<S: KeyValueStore>(store: &S, catalog: &Catalog, limit: usize) -> Result<()> {
    let entries = ReadingProgressStore::new(store).continue_reading(catalog, limit)?;
    if entries.is_empty() {
        println!("Nothing to continue yet.");
        return Ok(());
    }

    println!(
        "{:<36} {:<14} {:<28} {}",
        "TITLE", "CONTINUE", "LAST READ", "LINK"
    );
    for entry in entries {
        println!(
            "{:<36} {:<14} {:<28} {}",
            truncate(&entry.title, 36),
            format!("Ch. {}", entry.chapter),
            format_last_read_display(&entry.timestamp),
            entry.chapter_url()
        );
    }
    Ok(())
}

fn run_search(catalog: &Catalog, query: &str) {
    let matches = catalog.search(query);
    if matches.is_empty() {
        println!("No novels found matching \"{}\"", normalize_query(query));
        return;
    }

    println!("{:<36} {:<28} {:<10}", "TITLE", "AUTHOR", "CHAPTERS");
    for novel in matches {
        println!(
            "{:<36} {:<28} {:<10}",
            truncate(&novel.title, 36),
            truncate(novel.author.as_deref().unwrap_or("-"), 28),
            novel.chapters
        );
    }
}

fn run_latest(catalog: &Catalog) {
    if catalog.is_empty() {
        println!("The catalog is empty.");
        return;
    }

    println!("{:<28} {:<32} {:<14} {}", "NOVEL", "LATEST", "UPDATED", "LINK");
    for novel in catalog.novels() {
        println!(
            "{:<28} {:<32} {:<14} {}",
            truncate(&novel.title, 28),
            truncate(&novel.latest_chapter, 32),
            truncate(&novel.update_time, 14),
            novel.latest_chapter_url()
        );
    }
}

fn run_chapters<S: KeyValueStore>(
    store: &S,
    catalog: &Catalog,
    novel_id: &str,
    desc: bool,
) -> Result<()> {
    let Some(novel) = catalog.get(novel_id) else {
        bail!("unknown novel '{novel_id}'");
    };
    let current = ReadingProgressStore::new(store)
        .load_progress(novel_id)?
        .map(|record| record.chapter);
    let order = if desc { SortOrder::Desc } else { SortOrder::Asc };

    println!("{} ({} chapters)", novel.title, novel.chapters);
    for chapter in novel.chapter_listing(order) {
        let marker = if current == Some(chapter) { "▸" } else { " " };
        println!(
            "{marker} Chapter {chapter:<6} /novels/{}/chapter-{chapter}.html",
            novel.id
        );
    }
    Ok(())
}

fn run_theme<S: KeyValueStore>(store: &S, action: Option<ThemeAction>) -> Result<()> {
    let prefs = Preferences::new(store);
    let theme = match action {
        None => prefs.theme()?,
        Some(ThemeAction::Toggle) => prefs.toggle_theme()?,
        Some(ThemeAction::Light) => {
            prefs.set_theme(Theme::Light)?;
            Theme::Light
        }
        Some(ThemeAction::Dark) => {
            prefs.set_theme(Theme::Dark)?;
            Theme::Dark
        }
    };
    println!("Theme: {theme}");
    Ok(())
}

fn run_font<S: KeyValueStore>(store: &S, action: Option<FontAction>) -> Result<()> {
    let prefs = Preferences::new(store);
    let size = match action {
        None => prefs.font_size()?,
        Some(FontAction::Up) => prefs.adjust_font_size(FONT_SIZE_STEP)?,
        Some(FontAction::Down) => prefs.adjust_font_size(-FONT_SIZE_STEP)?,
        Some(FontAction::Reset) => prefs.reset_font_size()?,
    };
    println!("Font size: {}rem", format_font_size(size));
    Ok(())
}

fn open_db() -> Result<SqliteStore> {
    let db_path = database_file_path()?;
    let db = SqliteStore::open(&db_path)?;
    db.migrate()?;
    Ok(db)
}

/// The catalog and the directory chapter text files are looked up in.
fn open_catalog(explicit: Option<&Path>) -> Result<(Catalog, PathBuf)> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => catalog_file_path()?,
    };
    let catalog = if explicit.is_some() {
        Catalog::load(&path)?
    } else {
        Catalog::load_or_builtin(&path)?
    };
    let content_dir = content_dir_for(&path);
    Ok((catalog, content_dir))
}

fn content_dir_for(catalog_path: &Path) -> PathBuf {
    catalog_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}
