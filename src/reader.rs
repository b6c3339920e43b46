use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

const MIN_TEXT_COLUMNS: usize = 20;

/// Percentage of the scrollable range covered by `offset`, or `None` when the
/// content fits in the viewport and there is nothing to scroll.
pub fn scroll_percent(offset: usize, content_height: usize, viewport_height: usize) -> Option<f64> {
    let scrollable = content_height.checked_sub(viewport_height)?;
    if scrollable == 0 {
        return None;
    }
    Some(offset as f64 / scrollable as f64 * 100.0)
}

/// Line offset for a stored percentage, clamped to the scrollable range.
pub fn scroll_offset(percent: f64, content_height: usize, viewport_height: usize) -> usize {
    let scrollable = content_height.saturating_sub(viewport_height);
    if scrollable == 0 || !percent.is_finite() {
        return 0;
    }
    let offset = (percent / 100.0 * scrollable as f64).round();
    offset.clamp(0.0, scrollable as f64) as usize
}

/// Terminal stand-in for rem-based font scaling: larger text means fewer
/// characters per line.
pub fn text_columns(available: u16, font_size: f64) -> usize {
    let scale = if font_size.is_finite() && font_size > 0.0 {
        font_size
    } else {
        1.0
    };
    ((available as f64 / scale).floor() as usize).max(MIN_TEXT_COLUMNS)
}

pub fn chapter_file_path(content_dir: &Path, novel_id: &str, chapter: u32) -> PathBuf {
    content_dir
        .join(novel_id)
        .join(format!("chapter-{chapter}.txt"))
}

/// Chapter text from `<content_dir>/<novel>/chapter-<n>.txt`, if present.
pub fn load_chapter_text(
    content_dir: &Path,
    novel_id: &str,
    chapter: u32,
) -> Result<Option<String>> {
    let path = chapter_file_path(content_dir, novel_id, chapter);
    if !path.exists() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read chapter {}", path.display()))?;
    Ok(Some(text))
}

pub fn placeholder_text(title: &str, chapter: u32) -> String {
    format!(
        "{title}\n\nChapter {chapter} has no local text.\n\n\
         Place the chapter in <catalog dir>/<novel id>/chapter-{chapter}.txt \
         to read it here. Progress and scroll position are still tracked."
    )
}

/// Greedy word wrap. Paragraph breaks are kept as empty lines and words longer
/// than `width` are split.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut current = String::new();
        let mut current_len = 0usize;
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > width {
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let rest = word.split_off(width);
                lines.push(word.into_iter().collect());
                word = rest;
            }
            let needed = if current_len == 0 {
                word.len()
            } else {
                current_len + 1 + word.len()
            };
            if needed > width {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.extend(word.iter());
            current_len += word.len();
        }
        lines.push(current);
    }
    lines
}
