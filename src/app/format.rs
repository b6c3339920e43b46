use chrono::{DateTime, Local, Utc};

pub(crate) fn truncate(s: &str, max: usize) -> String {
    let mut out = s.to_string();
    if out.chars().count() > max {
        out = out.chars().take(max.saturating_sub(3)).collect::<String>() + "...";
    }
    out
}

pub(crate) fn format_last_read_display(timestamp: &DateTime<Utc>) -> String {
    timestamp
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M %:z")
        .to_string()
}

pub(crate) fn format_last_read_display_tui(timestamp: &DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format("%b %d %H:%M").to_string()
}

pub(crate) fn format_chapter_progress_text(chapter: u32, total_chapters: u32) -> String {
    if total_chapters == 0 {
        return format!("chapter {chapter}");
    }
    if chapter > total_chapters {
        return format!("{chapter} of {total_chapters} (past the catalog count)");
    }
    format!("{chapter} of {total_chapters}")
}

pub(crate) fn build_progress_gauge(chapter: u32, total_chapters: u32) -> Option<(f64, String)> {
    if total_chapters == 0 || chapter == 0 {
        return None;
    }
    let shown = chapter.min(total_chapters);
    let ratio = (shown as f64 / total_chapters as f64).clamp(0.0, 1.0);
    Some((ratio, format!("{shown}/{total_chapters}")))
}

pub(crate) fn format_percent(percent: f64) -> String {
    format!("{percent:.1}%")
}

/// Search text as the page echoes it back: trimmed and lowercased.
pub(crate) fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}
