//! Markdown engine using pulldown-cmark.

use std::path::Path;

use pulldown_cmark::{CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd, html};
use serde::Deserialize;

use crate::{Converter, RenderError, Result, html_escape, syntax::SyntaxHighlighter};

/// Optional YAML front matter of a Markdown source.
#[derive(Debug, Default, Deserialize)]
struct FrontMatter {
    #[serde(default)]
    title: Option<String>,
}

/// Markdown converter with syntax highlighting support.
#[derive(Debug)]
pub struct MarkdownConverter {
    highlighter: SyntaxHighlighter,
    options: Options,
    show_title: bool,
}

impl Default for MarkdownConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownConverter {
    /// Create a new converter with default options.
    pub fn new() -> Self {
        Self::with_highlighter(SyntaxHighlighter::default())
    }

    /// Create a converter with a custom syntax theme.
    pub fn with_theme(theme: &str) -> Self {
        Self::with_highlighter(SyntaxHighlighter::new(theme))
    }

    fn with_highlighter(highlighter: SyntaxHighlighter) -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);

        Self {
            highlighter,
            options,
            show_title: true,
        }
    }

    /// Render the front-matter title as `<h1>` when the body has no leading heading.
    #[must_use]
    pub fn show_title(mut self, show: bool) -> Self {
        self.show_title = show;
        self
    }

    /// Render a Markdown body to HTML, highlighting fenced code blocks.
    fn render_body(&self, body: &str) -> String {
        let mut events = Vec::new();
        let mut code: Option<(Option<String>, String)> = None;

        for event in Parser::new_ext(body, self.options) {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let lang = match kind {
                        CodeBlockKind::Fenced(info) => info
                            .split_whitespace()
                            .next()
                            .map(str::to_string),
                        CodeBlockKind::Indented => None,
                    };
                    code = Some((lang, String::new()));
                }
                Event::Text(text) if code.is_some() => {
                    if let Some((_, buf)) = code.as_mut() {
                        buf.push_str(&text);
                    }
                }
                Event::End(TagEnd::CodeBlock) => {
                    if let Some((lang, buf)) = code.take() {
                        let highlighted = self.highlighter.highlight(&buf, lang.as_deref());
                        events.push(Event::Html(CowStr::from(highlighted)));
                    }
                }
                other => events.push(other),
            }
        }

        let mut out = String::with_capacity(body.len() * 3 / 2);
        html::push_html(&mut out, events.into_iter());
        out
    }
}

impl Converter for MarkdownConverter {
    fn source_extension(&self) -> &'static str {
        "md"
    }

    fn convert(&self, source: &str, path: &Path) -> Result<String> {
        let (front, body) = match split_front_matter(source) {
            Some((yaml, body)) => {
                let front: FrontMatter = serde_yaml::from_str(yaml)
                    .map_err(|e| RenderError::failed(path, format!("front matter: {e}")))?;
                (front, body)
            }
            None => (FrontMatter::default(), source),
        };

        let mut fragment = String::new();
        if self.show_title
            && let Some(title) = front.title.as_deref().filter(|t| !t.trim().is_empty())
            && !starts_with_heading(body)
        {
            fragment.push_str(&format!("<h1>{}</h1>\n", html_escape(title)));
        }
        fragment.push_str(&self.render_body(body));
        Ok(fragment)
    }
}

/// Split `---` delimited YAML front matter from the body.
fn split_front_matter(content: &str) -> Option<(&str, &str)> {
    let rest = content.trim_start().strip_prefix("---")?;
    let rest = rest.strip_prefix('\n').or_else(|| rest.strip_prefix("\r\n"))?;
    let end = rest.find("\n---")?;
    let yaml = &rest[..end];
    let body = rest[end + 4..].trim_start_matches(['\r', '\n']);
    Some((yaml, body))
}

fn starts_with_heading(body: &str) -> bool {
    body.trim_start().starts_with("# ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(converter: &MarkdownConverter, source: &str) -> String {
        converter.convert(source, Path::new("intro.md")).unwrap()
    }

    #[test]
    fn test_fragment_has_no_shell() {
        let html = convert(&MarkdownConverter::new(), "# Intro\n\nWelcome to S3.");

        assert!(html.contains("<h1>Intro</h1>"));
        assert!(html.contains("<p>Welcome to S3.</p>"));
        assert!(!html.contains("<html"));
        assert!(!html.contains("<body"));
    }

    #[test]
    fn test_front_matter_title_shown() {
        let html = convert(
            &MarkdownConverter::new(),
            "---\ntitle: Getting Started\n---\n\nSome text.",
        );

        assert!(html.starts_with("<h1>Getting Started</h1>"));
        assert!(html.contains("<p>Some text.</p>"));
        assert!(!html.contains("title:"));
    }

    #[test]
    fn test_front_matter_title_hidden() {
        let converter = MarkdownConverter::new().show_title(false);
        let html = convert(&converter, "---\ntitle: Hidden\n---\nBody");

        assert!(!html.contains("Hidden"));
        assert!(html.contains("Body"));
    }

    #[test]
    fn test_title_not_duplicated_when_body_has_heading() {
        let html = convert(&MarkdownConverter::new(), "---\ntitle: Intro\n---\n# Intro\n");
        assert_eq!(html.matches("<h1>").count(), 1);
    }

    #[test]
    fn test_bad_front_matter_fails() {
        let err = MarkdownConverter::new()
            .convert("---\ntitle: [oops\n---\nbody", Path::new("bad.md"))
            .unwrap_err();
        assert!(matches!(err, RenderError::Failed { .. }));
        assert!(err.to_string().contains("bad.md"));
    }

    #[test]
    fn test_code_block_highlighted() {
        let html = convert(
            &MarkdownConverter::new(),
            "```rust\nfn main() {}\n```\n",
        );
        assert!(html.contains("<pre"));
        assert!(html.contains("main"));
        assert!(!html.contains("```"));
    }

    #[test]
    fn test_table_rendering() {
        let html = convert(
            &MarkdownConverter::new(),
            "| Header 1 | Header 2 |\n|----------|----------|\n| Cell 1   | Cell 2   |",
        );
        assert!(html.contains("<table>"));
        assert!(html.contains("<thead>"));
        assert!(html.contains("<td>Cell 1</td>"));
    }

    #[test]
    fn test_split_front_matter() {
        assert_eq!(
            split_front_matter("---\ntitle: A\n---\nbody"),
            Some(("title: A", "body"))
        );
        assert_eq!(split_front_matter("no front matter"), None);
        assert_eq!(split_front_matter("---not yaml"), None);
    }
}
