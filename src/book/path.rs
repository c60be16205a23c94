//! Node path addressing
//!
//! A location in the codex is written `section-chapter[-page]` with zero-based
//! indices. Two segments address a chapter, three address a page. Parsing never
//! fails loudly: anything malformed or out of range means "nothing selected".

use crate::book::{Book, Chapter, Page, Section};
use std::fmt;
use std::str::FromStr;

pub const PATH_SEPARATOR: char = '-';

/// Parsed codex address. `page == None` addresses the chapter itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodePath {
    pub section: usize,
    pub chapter: usize,
    pub page: Option<usize>,
}

/// A path resolved against a concrete book.
#[derive(Debug, Clone, Copy)]
pub enum Selection<'a> {
    Chapter {
        path: NodePath,
        section: &'a Section,
        chapter: &'a Chapter,
    },
    Page {
        path: NodePath,
        section: &'a Section,
        chapter: &'a Chapter,
        page: &'a Page,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePathError(String);

impl fmt::Display for ParsePathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid codex path '{}'", self.0)
    }
}

impl std::error::Error for ParsePathError {}

impl NodePath {
    pub fn chapter(section: usize, chapter: usize) -> Self {
        Self {
            section,
            chapter,
            page: None,
        }
    }

    pub fn page(section: usize, chapter: usize, page: usize) -> Self {
        Self {
            section,
            chapter,
            page: Some(page),
        }
    }

    /// Parse a path, returning `None` for anything that is not 2 or 3 integers.
    pub fn parse(input: &str) -> Option<Self> {
        let segments: Vec<&str> = input.trim().split(PATH_SEPARATOR).collect();
        if segments.len() < 2 || segments.len() > 3 {
            return None;
        }
        let mut indices = Vec::with_capacity(3);
        for segment in segments {
            indices.push(segment.parse::<usize>().ok()?);
        }
        Some(Self {
            section: indices[0],
            chapter: indices[1],
            page: indices.get(2).copied(),
        })
    }

    pub fn is_page(&self) -> bool {
        self.page.is_some()
    }

    /// The chapter this path lives in.
    pub fn chapter_path(&self) -> NodePath {
        NodePath::chapter(self.section, self.chapter)
    }

    /// Resolve against `book`; `None` if any index is out of range.
    pub fn resolve<'a>(&self, book: &'a Book) -> Option<Selection<'a>> {
        let section = book.section(self.section)?;
        let chapter = section.chapters.get(self.chapter)?;
        match self.page {
            None => Some(Selection::Chapter {
                path: *self,
                section,
                chapter,
            }),
            Some(index) => Some(Selection::Page {
                path: *self,
                section,
                chapter,
                page: chapter.pages.get(index)?,
            }),
        }
    }
}

impl FromStr for NodePath {
    type Err = ParsePathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodePath::parse(s).ok_or_else(|| ParsePathError(s.to_string()))
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.section, PATH_SEPARATOR, self.chapter)?;
        if let Some(page) = self.page {
            write!(f, "{}{}", PATH_SEPARATOR, page)?;
        }
        Ok(())
    }
}

/// Parse and resolve in one step; the presentation layer's selection lookup.
pub fn resolve_path<'a>(book: &'a Book, input: &str) -> Option<Selection<'a>> {
    NodePath::parse(input)?.resolve(book)
}

impl<'a> Selection<'a> {
    pub fn path(&self) -> NodePath {
        match *self {
            Selection::Chapter { path, .. } | Selection::Page { path, .. } => path,
        }
    }

    pub fn section(&self) -> &'a Section {
        match *self {
            Selection::Chapter { section, .. } | Selection::Page { section, .. } => section,
        }
    }

    pub fn chapter(&self) -> &'a Chapter {
        match *self {
            Selection::Chapter { chapter, .. } | Selection::Page { chapter, .. } => chapter,
        }
    }

    pub fn page(&self) -> Option<&'a Page> {
        match *self {
            Selection::Chapter { .. } => None,
            Selection::Page { page, .. } => Some(page),
        }
    }
}
