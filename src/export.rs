//! Static HTML rendering of the codex.

use crate::book::{Book, CODEX_TITLE};
use std::fmt::Write;

pub const DEFAULT_EXPORT_FILE: &str = "Aletheia_Engine_Codex.html";

const STYLE: &str = "<style>
body { font-family: sans-serif; line-height: 1.7; max-width: 800px; margin: 0 auto; padding: 40px; }
h1, h2, h3, h4 { font-family: monospace; }
h1 { text-align: center; }
.toc { list-style: none; padding-left: 0; }
.toc-section { font-weight: bold; margin-top: 1em; }
.toc-chapter { padding-left: 2em; }
</style>";

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Render the whole codex as one self-contained HTML document.
///
/// Output depends only on `book`.
pub fn render_html(book: &Book) -> String {
    let mut body = String::new();
    // writing into a String cannot fail
    let _ = render_body(book, &mut body);

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
<title>{title}</title>\n{STYLE}\n</head>\n<body>\n{body}</body>\n</html>\n",
        title = escape_html(CODEX_TITLE),
    )
}

fn render_body(book: &Book, out: &mut String) -> std::fmt::Result {
    writeln!(out, "<h1>{}</h1>", escape_html(CODEX_TITLE))?;

    writeln!(out, "<h2>Codex Table of Contents</h2>\n<ul class=\"toc\">")?;
    for (s, section) in book.sections().iter().enumerate() {
        writeln!(
            out,
            "<li class=\"toc-section\"><a href=\"#section-{s}\">{}. {}</a></li>",
            s + 1,
            escape_html(&section.title)
        )?;
        for (c, chapter) in section.chapters.iter().enumerate() {
            writeln!(
                out,
                "<li class=\"toc-chapter\"><a href=\"#chapter-{s}-{c}\">{}.{}. {}</a></li>",
                s + 1,
                c + 1,
                escape_html(&chapter.title)
            )?;
        }
    }
    writeln!(out, "</ul>")?;

    for (s, section) in book.sections().iter().enumerate() {
        writeln!(
            out,
            "<h2 id=\"section-{s}\">{}. {}</h2>",
            s + 1,
            escape_html(&section.title)
        )?;
        for (c, chapter) in section.chapters.iter().enumerate() {
            writeln!(
                out,
                "<h3 id=\"chapter-{s}-{c}\">Chapter {}.{}: {}</h3>",
                s + 1,
                c + 1,
                escape_html(&chapter.title)
            )?;
            if chapter.pages.is_empty() {
                writeln!(out, "<p><em>[No fragments in this chapter.]</em></p>")?;
            }
            for (p, page) in chapter.pages.iter().enumerate() {
                writeln!(
                    out,
                    "<h4>Fragment {}.{}.{}: {}</h4>",
                    s + 1,
                    c + 1,
                    p + 1,
                    escape_html(&page.title)
                )?;
                if !page.is_synthesized() {
                    writeln!(out, "<p><em>[This fragment is unsynthesized.]</em></p>")?;
                    continue;
                }
                for paragraph in page.content.split('\n').filter(|line| !line.trim().is_empty()) {
                    writeln!(out, "<p>{}</p>", escape_html(paragraph))?;
                }
            }
        }
    }
    Ok(())
}
