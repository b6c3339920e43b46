use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{TimeZone, Utc};

use novelmark::catalog::Catalog;
use novelmark::store::{KeyValueStore, MemoryStore};

use super::content_dir_for;
use super::format::*;
use super::tui::{
    Focus, LibraryState, ReaderState, TuiContext, leave_chapter, open_chapter, tick_reader,
};

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

fn long_text(paragraphs: usize) -> String {
    (0..paragraphs)
        .map(|idx| format!("Paragraph {idx} of the chapter goes on for a little while."))
        .collect::<Vec<_>>()
        .join("\n")
}

fn laid_out_reader(lines: usize, viewport: usize) -> ReaderState {
    let mut reader = ReaderState::new("martial-peak", "Martial Peak", 6009, 12, long_text(lines));
    reader.relayout(200, viewport);
    assert_eq!(reader.lines.len(), lines);
    reader
}

#[test]
fn truncate_adds_ellipsis_past_limit() {
    assert_eq!(truncate("Reverend Insanity", 10), "Reveren...");
    assert_eq!(truncate("Short", 10), "Short");
}

#[test]
fn chapter_progress_text_flags_chapters_past_catalog_count() {
    assert_eq!(format_chapter_progress_text(12, 1394), "12 of 1394");
    assert_eq!(
        format_chapter_progress_text(1400, 1394),
        "1400 of 1394 (past the catalog count)"
    );
    assert_eq!(format_chapter_progress_text(3, 0), "chapter 3");
}

#[test]
fn progress_gauge_ratio_is_capped() {
    let (ratio, label) = build_progress_gauge(50, 200).expect("gauge should build");
    assert!((ratio - 0.25).abs() < 1e-9);
    assert_eq!(label, "50/200");

    let (ratio, label) = build_progress_gauge(300, 200).expect("gauge should build");
    assert!((ratio - 1.0).abs() < 1e-9);
    assert_eq!(label, "200/200");

    assert!(build_progress_gauge(0, 200).is_none());
    assert!(build_progress_gauge(5, 0).is_none());
}

#[test]
fn last_read_display_uses_local_calendar_date() {
    let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let shown = format_last_read_display(&ts);
    assert!(shown.starts_with("2024-0"), "unexpected display: {shown}");
}

#[test]
fn percent_and_query_formatting() {
    assert_eq!(format_percent(42.5), "42.5%");
    assert_eq!(normalize_query("  Lord OF  "), "lord of");
}

#[test]
fn content_dir_is_catalog_parent() {
    assert_eq!(
        content_dir_for(Path::new("/srv/novels/novels.json")),
        PathBuf::from("/srv/novels")
    );
    assert_eq!(content_dir_for(Path::new("novels.json")), PathBuf::from("."));
}

#[test]
fn focus_toggles_between_tables() {
    assert_eq!(Focus::Continue.toggled(), Focus::Library);
    assert_eq!(Focus::Library.toggled(), Focus::Continue);
    assert_eq!(Focus::Library.label(), "LIBRARY");
}

#[test]
fn reader_scroll_is_clamped_and_arms_debounce() {
    let start = Instant::now();
    let mut reader = laid_out_reader(60, 20);

    assert!(!reader.scroll_by(-1, start));
    assert!(!reader.save_debounce.is_pending());

    assert!(reader.scroll_by(20, start));
    assert_eq!(reader.offset, 20);
    assert!(reader.save_debounce.is_pending());

    assert!(reader.scroll_to(1_000, start));
    assert_eq!(reader.offset, reader.max_offset());
    assert_eq!(reader.scroll_percent(), Some(100.0));
}

#[test]
fn reader_relayout_keeps_relative_position() {
    let start = Instant::now();
    let mut reader = laid_out_reader(60, 20);
    reader.scroll_to(20, start);
    assert_eq!(reader.scroll_percent(), Some(50.0));

    reader.relayout(200, 40);
    assert_eq!(reader.offset, 10);
    assert_eq!(reader.scroll_percent(), Some(50.0));
}

#[test]
fn navigation_bounds_follow_chapter_count() {
    let first = ReaderState::new("n", "N", 3, 1, String::new());
    assert!(!first.has_previous());
    assert!(first.has_next());

    let last = ReaderState::new("n", "N", 3, 3, String::new());
    assert!(last.has_previous());
    assert!(!last.has_next());
}

#[test]
fn open_chapter_records_progress_and_schedules_restore() {
    let store = MemoryStore::new();
    let catalog = Catalog::builtin().expect("bundled catalog should parse");
    let ctx = TuiContext::new(&store, &catalog, Path::new("/nonexistent/novelmark"));
    let novel = catalog.get("lord-of-mysteries").expect("sample novel");

    ctx.progress
        .save_scroll(&novel.id, 7, 50.0)
        .expect("scroll should save");

    let start = Instant::now();
    let mut reader = open_chapter(&ctx, novel, 7, start).expect("chapter should open");
    let saved = ctx
        .progress
        .load_progress(&novel.id)
        .unwrap()
        .expect("visit should be recorded");
    assert_eq!(saved.chapter, 7);
    assert!(reader.lines.is_empty());

    reader.relayout(40, 4);
    tick_reader(&ctx.progress, &mut reader, start + ms(50)).unwrap();
    assert_eq!(reader.offset, 0);

    tick_reader(&ctx.progress, &mut reader, start + ms(100)).unwrap();
    let expected = novelmark::reader::scroll_offset(50.0, reader.lines.len(), reader.viewport);
    assert_eq!(reader.offset, expected);
}

#[test]
fn open_chapter_reads_text_from_content_dir() {
    let dir = std::env::temp_dir().join(format!("novelmark-test-{}", std::process::id()));
    let chapter_dir = dir.join("martial-peak");
    std::fs::create_dir_all(&chapter_dir).unwrap();
    std::fs::write(chapter_dir.join("chapter-2.txt"), "Yang Kai opened his eyes.").unwrap();

    let store = MemoryStore::new();
    let catalog = Catalog::builtin().expect("bundled catalog should parse");
    let ctx = TuiContext::new(&store, &catalog, &dir);
    let novel = catalog.get("martial-peak").expect("sample novel");

    let mut reader = open_chapter(&ctx, novel, 2, Instant::now()).expect("chapter should open");
    reader.relayout(80, 10);
    assert_eq!(reader.lines, vec!["Yang Kai opened his eyes.".to_string()]);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn scroll_save_waits_for_quiet_period() {
    let store = MemoryStore::new();
    let catalog = Catalog::builtin().expect("bundled catalog should parse");
    let ctx = TuiContext::new(&store, &catalog, Path::new("/nonexistent/novelmark"));
    let start = Instant::now();
    let mut reader = laid_out_reader(60, 20);

    reader.scroll_by(10, start);
    reader.scroll_by(10, start + ms(300));
    tick_reader(&ctx.progress, &mut reader, start + ms(600)).unwrap();
    assert_eq!(ctx.progress.load_scroll("martial-peak", 12).unwrap(), None);

    tick_reader(&ctx.progress, &mut reader, start + ms(800)).unwrap();
    assert_eq!(
        ctx.progress.load_scroll("martial-peak", 12).unwrap(),
        Some(50.0)
    );
    assert_eq!(store.keys().unwrap(), vec!["scroll_martial-peak_12".to_string()]);
}

#[test]
fn leaving_chapter_flushes_pending_scroll() {
    let store = MemoryStore::new();
    let catalog = Catalog::builtin().expect("bundled catalog should parse");
    let ctx = TuiContext::new(&store, &catalog, Path::new("/nonexistent/novelmark"));
    let start = Instant::now();
    let mut reader = laid_out_reader(60, 20);

    reader.scroll_to(40, start);
    leave_chapter(&ctx.progress, &mut reader).unwrap();
    assert_eq!(
        ctx.progress.load_scroll("martial-peak", 12).unwrap(),
        Some(100.0)
    );
    assert!(!reader.save_debounce.is_pending());
}

#[test]
fn library_state_starts_on_library_table() {
    let library = LibraryState::new();
    assert_eq!(library.focus, Focus::Library);
    assert!(library.query.is_empty());
    assert!(!library.searching);
}
