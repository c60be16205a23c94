//! Document Model
//!
//! The codex is a fixed tree of sections and chapters whose chapters grow pages.
//! Structure (sections, chapters, their titles and order) is set once from the
//! template; only chapter `pages` and page strings change at runtime.
//!
//! Mutation never happens on a shared tree. Callers clone the current book,
//! apply one of the `with_*` transforms below and swap the result in as a whole,
//! so every observer sees either the old tree or the new one.

pub mod path;
pub mod template;

pub use path::{resolve_path, NodePath, Selection};
pub use template::{codex_template, CODEX_TITLE, FIRST_SECTION_TITLE};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Chapter title -> ordered page titles, as returned by a scaffold request.
pub type Outline = HashMap<String, Vec<String>>;

/// Page title -> narrative text, as returned by a synthesis request.
pub type ChapterContents = HashMap<String, String>;

/// Leaf of the codex. Empty `content` means the page still needs synthesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub title: String,
    #[serde(default)]
    pub content: String,
}

impl Page {
    /// A titled page with no content yet
    pub fn pending(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: String::new(),
        }
    }

    pub fn is_synthesized(&self) -> bool {
        !self.content.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub title: String,
    #[serde(default)]
    pub pages: Vec<Page>,
}

impl Chapter {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            pages: Vec::new(),
        }
    }

    /// True iff the chapter has pages and at least one of them is empty.
    pub fn needs_synthesis(&self) -> bool {
        !self.pages.is_empty() && self.pages.iter().any(|page| !page.is_synthesized())
    }

    pub fn page_titles(&self) -> Vec<String> {
        self.pages.iter().map(|page| page.title.clone()).collect()
    }

    /// Overwrite the content of every page whose title appears in `contents`.
    ///
    /// Pages absent from the mapping are left untouched. Pages sharing a title
    /// all receive the same text. Returns the number of pages written.
    pub fn apply_contents(&mut self, contents: &ChapterContents) -> usize {
        let mut written = 0;
        for page in &mut self.pages {
            if let Some(content) = contents.get(&page.title) {
                page.content = content.clone();
                written += 1;
            }
        }
        written
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
}

impl Section {
    pub fn new(title: impl Into<String>, chapters: Vec<Chapter>) -> Self {
        Self {
            title: title.into(),
            chapters,
        }
    }

    pub fn chapter_titles(&self) -> Vec<String> {
        self.chapters.iter().map(|chapter| chapter.title.clone()).collect()
    }

    /// Replace the pages of every chapter named in `outline` with content-less pages.
    ///
    /// Returns the number of chapters that received pages.
    pub fn apply_outline(&mut self, outline: &Outline) -> usize {
        let mut populated = 0;
        for chapter in &mut self.chapters {
            if let Some(titles) = outline.get(&chapter.title) {
                chapter.pages = titles.iter().map(Page::pending).collect();
                populated += 1;
            }
        }
        populated
    }
}

/// The whole codex: an ordered sequence of sections.
///
/// Serializes as a bare JSON array of sections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Book {
    sections: Vec<Section>,
}

impl Book {
    pub fn new(sections: Vec<Section>) -> Self {
        Self { sections }
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, index: usize) -> Option<&Section> {
        self.sections.get(index)
    }

    pub fn chapter(&self, section: usize, chapter: usize) -> Option<&Chapter> {
        self.section(section)?.chapters.get(chapter)
    }

    pub fn page(&self, section: usize, chapter: usize, page: usize) -> Option<&Page> {
        self.chapter(section, chapter)?.pages.get(page)
    }

    /// True iff at least one chapter anywhere has pages.
    pub fn is_scaffolded(&self) -> bool {
        self.sections
            .iter()
            .any(|section| section.chapters.iter().any(|chapter| !chapter.pages.is_empty()))
    }

    pub fn chapter_count(&self) -> usize {
        self.sections.iter().map(|section| section.chapters.len()).sum()
    }

    pub fn page_count(&self) -> usize {
        self.pages().count()
    }

    pub fn synthesized_count(&self) -> usize {
        self.pages().filter(|page| page.is_synthesized()).count()
    }

    fn pages(&self) -> impl Iterator<Item = &Page> {
        self.sections
            .iter()
            .flat_map(|section| section.chapters.iter())
            .flat_map(|chapter| chapter.pages.iter())
    }

    /// Copy of this book with `outline` applied to one section.
    ///
    /// Returns `None` if the section does not exist.
    pub fn with_outline(&self, section: usize, outline: &Outline) -> Option<Book> {
        let mut next = self.clone();
        next.sections.get_mut(section)?.apply_outline(outline);
        Some(next)
    }

    /// Copy of this book with `contents` merged into one chapter.
    pub fn with_contents(
        &self,
        section: usize,
        chapter: usize,
        contents: &ChapterContents,
    ) -> Option<Book> {
        let mut next = self.clone();
        next.sections
            .get_mut(section)?
            .chapters
            .get_mut(chapter)?
            .apply_contents(contents);
        Some(next)
    }

    /// Copy of this book with one page's content replaced.
    ///
    /// Returns `None` unless `path` addresses an existing page.
    pub fn with_page_content(&self, path: NodePath, content: impl Into<String>) -> Option<Book> {
        let page_index = path.page?;
        let mut next = self.clone();
        let page = next
            .sections
            .get_mut(path.section)?
            .chapters
            .get_mut(path.chapter)?
            .pages
            .get_mut(page_index)?;
        page.content = content.into();
        Some(next)
    }
}

/// Free-function form of [`Book::is_scaffolded`].
pub fn is_scaffolded(book: &Book) -> bool {
    book.is_scaffolded()
}

/// Free-function form of [`Chapter::needs_synthesis`].
pub fn needs_synthesis(chapter: &Chapter) -> bool {
    chapter.needs_synthesis()
}
