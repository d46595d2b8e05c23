//! Markdown rendering with syntax highlighting

use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use syntect::highlighting::ThemeSet;
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;
use thiserror::Error;

use crate::config::HighlightConfig;

/// Errors produced while converting Markdown to HTML
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("body is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}

/// Markdown renderer with syntax highlighting
pub struct MarkdownRenderer {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    theme_name: String,
    highlight: bool,
    line_numbers: bool,
}

impl MarkdownRenderer {
    /// Create a new markdown renderer
    pub fn new() -> Self {
        Self::with_options(&HighlightConfig::default())
    }

    /// Create with custom settings
    pub fn with_options(config: &HighlightConfig) -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
            theme_name: config.theme.clone(),
            highlight: config.enable,
            line_numbers: config.line_number,
        }
    }

    /// Render a markdown body to HTML
    pub fn render(&self, markdown: &[u8]) -> Result<String, RenderError> {
        let markdown = std::str::from_utf8(markdown)?;

        // Front-matter is stripped by FrontMatter::parse, so no metadata blocks here
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_SMART_PUNCTUATION
            | Options::ENABLE_HEADING_ATTRIBUTES
            | Options::ENABLE_GFM;
        let parser = Parser::new_ext(markdown, options);

        let mut events: Vec<Event> = Vec::new();
        let mut code_block: Option<Option<String>> = None;
        let mut code_block_content = String::new();

        for event in parser {
            match event {
                Event::Start(Tag::CodeBlock(kind)) if self.highlight => {
                    let lang = match kind {
                        CodeBlockKind::Fenced(info) => {
                            info.split_whitespace().next().map(String::from)
                        }
                        CodeBlockKind::Indented => None,
                    };
                    code_block = Some(lang);
                    code_block_content.clear();
                }
                Event::End(TagEnd::CodeBlock) if code_block.is_some() => {
                    let lang = code_block.take().flatten();
                    let highlighted = self.highlight_code(&code_block_content, lang.as_deref());
                    events.push(Event::Html(CowStr::from(highlighted)));
                }
                Event::Text(text) if code_block.is_some() => {
                    code_block_content.push_str(&text);
                }
                _ => events.push(event),
            }
        }

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());

        Ok(html_output)
    }

    /// Highlight a code block
    fn highlight_code(&self, code: &str, lang: Option<&str>) -> String {
        let lang = lang.unwrap_or("text");
        let class = html_escape(lang);

        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_extension(lang))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let theme = self
            .theme_set
            .themes
            .get(&self.theme_name)
            .or_else(|| self.theme_set.themes.values().next());

        let highlighted = theme.and_then(|theme| {
            highlighted_html_for_string(code, &self.syntax_set, syntax, theme).ok()
        });

        match highlighted {
            Some(highlighted) if self.line_numbers => self.add_line_numbers(&highlighted, &class),
            Some(highlighted) => format!(
                r#"<figure class="highlight {}">{}</figure>"#,
                class, highlighted
            ),
            None => format!(
                r#"<pre><code class="language-{}">{}</code></pre>"#,
                class,
                html_escape(code)
            ),
        }
    }

    /// Add line numbers to highlighted code; `class` must already be escaped
    fn add_line_numbers(&self, code: &str, class: &str) -> String {
        let lines: Vec<&str> = code.lines().collect();

        let gutter = (1..=lines.len())
            .map(|n| format!(r#"<span class="line-number">{}</span>"#, n))
            .collect::<Vec<_>>()
            .join("\n");
        let code_lines = lines.join("\n");

        format!(
            r#"<figure class="highlight {}"><table><tr><td class="gutter"><pre>{}</pre></td><td class="code">{}</td></tr></table></figure>"#,
            class, gutter, code_lines
        )
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Simple HTML escaping
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_basic_markdown() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render(b"# Hello World\n\nThis is a test.").unwrap();
        assert!(html.contains("<h1>Hello World</h1>"));
        assert!(html.contains("<p>This is a test.</p>"));
    }

    #[test]
    fn test_emphasis_markers_are_consumed() {
        let renderer = MarkdownRenderer::new();
        let html = renderer
            .render(b"Some **bold** and _italic_ and ~~gone~~ text.")
            .unwrap();
        assert!(html.contains("<strong>bold</strong>"));
        assert!(html.contains("<em>italic</em>"));
        assert!(html.contains("<del>gone</del>"));
        assert!(!html.contains("**"));
        assert!(!html.contains("~~"));
    }

    #[test]
    fn test_render_code_block() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render(b"```rust\nfn main() {}\n```").unwrap();
        assert!(html.contains(r#"<figure class="highlight rust">"#));
        assert!(html.contains("line-number"));
        assert!(!html.contains("```"));
    }

    #[test]
    fn test_code_block_info_string_cannot_break_class_attribute() {
        let renderer = MarkdownRenderer::new();
        let html = renderer
            .render(b"```rust\" onclick=\"alert(1) extra\nfn main() {}\n```")
            .unwrap();
        assert!(html.contains(r#"<figure class="highlight rust&quot;">"#));
        assert!(!html.contains("onclick"));
    }

    #[test]
    fn test_highlight_disabled_keeps_plain_code() {
        let config = HighlightConfig {
            enable: false,
            ..Default::default()
        };
        let renderer = MarkdownRenderer::with_options(&config);
        let html = renderer.render(b"```rust\nlet x = 1 < 2;\n```").unwrap();
        assert!(html.contains(r#"<code class="language-rust">"#));
        assert!(html.contains("1 &lt; 2"));
    }

    #[test]
    fn test_indented_code_block_is_highlighted_as_text() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render(b"Intro\n\n    plain code\n").unwrap();
        assert!(html.contains(r#"<figure class="highlight text">"#));
        assert!(html.contains("plain code"));
    }

    #[test]
    fn test_invalid_utf8_is_a_render_error() {
        let renderer = MarkdownRenderer::new();
        let err = renderer.render(b"valid start \xFF\xFE").unwrap_err();
        assert!(matches!(err, RenderError::InvalidUtf8(_)));
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("<a href=\"x\">&'"), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }
}
