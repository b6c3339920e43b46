use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

const BUILTIN_CATALOG: &str = include_str!("../data/novels.json");

/// Queries shorter than this show the whole catalog.
pub const MIN_QUERY_CHARS: usize = 2;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Novel {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    pub cover: String,
    pub chapters: u32,
    #[serde(default)]
    pub genres: Vec<String>,
    pub latest_chapter: String,
    pub update_time: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl Novel {
    pub fn url(&self) -> String {
        format!("/novels/{}/", self.id)
    }

    /// `"Chapter 12: The End"` becomes `"chapter-12-the-end"`.
    pub fn latest_chapter_slug(&self) -> String {
        self.latest_chapter
            .to_lowercase()
            .replace(' ', "-")
            .chars()
            .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
            .collect()
    }

    pub fn latest_chapter_url(&self) -> String {
        format!("/novels/{}/{}", self.id, self.latest_chapter_slug())
    }

    pub fn has_chapter(&self, chapter: u32) -> bool {
        chapter >= 1 && chapter <= self.chapters
    }

    pub fn chapter_listing(&self, order: SortOrder) -> Vec<u32> {
        match order {
            SortOrder::Asc => (1..=self.chapters).collect(),
            SortOrder::Desc => (1..=self.chapters).rev().collect(),
        }
    }

    fn matches(&self, query: &str) -> bool {
        self.title.to_lowercase().contains(query)
            || self
                .author
                .as_deref()
                .is_some_and(|author| author.to_lowercase().contains(query))
            || self
                .genres
                .iter()
                .any(|genre| genre.to_lowercase().contains(query))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    novels: Vec<Novel>,
}

impl Catalog {
    pub fn new(novels: Vec<Novel>) -> Self {
        Self { novels }
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let novels: Vec<Novel> =
            serde_json::from_str(raw).context("catalog is not a JSON array of novels")?;
        Ok(Self { novels })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("failed to parse catalog {}", path.display()))
    }

    /// Sample catalog used when no data file is present.
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_CATALOG)
    }

    /// Loads `path` when it exists, otherwise falls back to the built-in sample.
    pub fn load_or_builtin(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::load(path);
        }
        log::warn!(
            "catalog {} not found, using built-in sample",
            path.display()
        );
        Self::builtin()
    }

    pub fn novels(&self) -> &[Novel] {
        &self.novels
    }

    pub fn is_empty(&self) -> bool {
        self.novels.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Novel> {
        self.novels.iter().find(|novel| novel.id == id)
    }

    /// Case-insensitive match on title, author or any genre.
    pub fn search(&self, query: &str) -> Vec<&Novel> {
        let query = query.trim().to_lowercase();
        if query.chars().count() < MIN_QUERY_CHARS {
            return self.novels.iter().collect();
        }
        self.novels
            .iter()
            .filter(|novel| novel.matches(&query))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn novel(id: &str, title: &str, author: Option<&str>, genres: &[&str]) -> Novel {
        Novel {
            id: id.to_string(),
            title: title.to_string(),
            author: author.map(str::to_string),
            cover: format!("https://covers.example/{id}.png"),
            chapters: 10,
            genres: genres.iter().map(|g| g.to_string()).collect(),
            latest_chapter: "Chapter 10: Finale".to_string(),
            update_time: "1 hour ago".to_string(),
        }
    }

    fn sample() -> Catalog {
        Catalog::new(vec![
            novel("a", "Sword Saint", Some("Li Wei"), &["Wuxia"]),
            novel("b", "Quiet Library", None, &["Mystery", "Slice of Life"]),
            novel("c", "Star Forge", Some("Ann Mystere"), &[]),
        ])
    }

    #[test]
    fn builtin_catalog_parses() {
        let catalog = Catalog::builtin().expect("bundled catalog should parse");
        assert_eq!(catalog.novels().len(), 4);
        assert_eq!(
            catalog.get("martial-peak").map(|n| n.chapters),
            Some(6009)
        );
    }

    #[test]
    fn search_with_short_query_returns_everything() {
        let catalog = sample();
        assert_eq!(catalog.search("").len(), 3);
        assert_eq!(catalog.search("  s ").len(), 3);
    }

    #[test]
    fn search_matches_title_author_and_genre_case_insensitively() {
        let catalog = sample();
        let ids = |query: &str| {
            catalog
                .search(query)
                .into_iter()
                .map(|n| n.id.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(ids("SWORD"), vec!["a"]);
        assert_eq!(ids("li wei"), vec!["a"]);
        assert_eq!(ids("myster"), vec!["b", "c"]);
        assert_eq!(ids("slice"), vec!["b"]);
    }

    #[test]
    fn search_without_hits_is_empty() {
        assert!(sample().search("dragon").is_empty());
    }

    #[test]
    fn latest_chapter_slug_strips_punctuation() {
        let novel = novel("rev", "Rev", None, &[]);
        assert_eq!(novel.latest_chapter_slug(), "chapter-10-finale");
        assert_eq!(novel.latest_chapter_url(), "/novels/rev/chapter-10-finale");
    }

    #[test]
    fn chapter_listing_respects_order() {
        let mut novel = novel("x", "X", None, &[]);
        novel.chapters = 3;
        assert_eq!(novel.chapter_listing(SortOrder::Asc), vec![1, 2, 3]);
        assert_eq!(novel.chapter_listing(SortOrder::Desc), vec![3, 2, 1]);
        assert!(novel.has_chapter(3));
        assert!(!novel.has_chapter(0));
        assert!(!novel.has_chapter(4));
    }

    #[test]
    fn from_json_accepts_missing_optional_fields() {
        let raw = r#"[{"id":"n1","title":"T","cover":"c","chapters":5,
            "latestChapter":"Chapter 5","updateTime":"now"}]"#;
        let catalog = Catalog::from_json(raw).expect("minimal novel should parse");
        let novel = catalog.get("n1").expect("novel should be present");
        assert!(novel.author.is_none());
        assert!(novel.genres.is_empty());
    }

    #[test]
    fn from_json_rejects_non_array() {
        assert!(Catalog::from_json("{\"id\":\"n1\"}").is_err());
    }
}
