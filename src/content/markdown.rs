//! Markdown rendering with syntax highlighting, math and diagrams

use anyhow::Result;
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use syntect::highlighting::ThemeSet;
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

use super::FrontMatter;
use crate::config::HighlightConfig;
use crate::helpers::escape_html;

/// Front-matter together with the rendered body
#[derive(Debug, Clone)]
pub struct ProcessedMarkdown {
    pub front_matter: FrontMatter,
    pub content: String,
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

    /// Split the front-matter off a source file and render the body
    pub fn process(&self, source: &str) -> Result<ProcessedMarkdown> {
        let (front_matter, body) = FrontMatter::parse(source)?;
        let content = self.render(body)?;
        Ok(ProcessedMarkdown {
            front_matter,
            content,
        })
    }

    /// Render markdown to HTML
    pub fn render(&self, markdown: &str) -> Result<String> {
        // YAML metadata blocks are handled by FrontMatter::parse()
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_HEADING_ATTRIBUTES
            | Options::ENABLE_MATH
            | Options::ENABLE_GFM;
        let parser = Parser::new_ext(markdown, options);

        let mut events: Vec<Event> = Vec::new();
        let mut in_code_block = false;
        let mut code_block_lang: Option<String> = None;
        let mut code_block_content = String::new();

        for event in parser {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    in_code_block = true;
                    code_block_lang = match kind {
                        CodeBlockKind::Fenced(lang) => {
                            // "rust,ignore" / "js {1,3}" → first word only
                            let lang = lang
                                .split(|c: char| c == ',' || c.is_whitespace())
                                .next()
                                .unwrap_or("")
                                .to_string();
                            if lang.is_empty() {
                                None
                            } else {
                                Some(lang)
                            }
                        }
                        CodeBlockKind::Indented => None,
                    };
                    code_block_content.clear();
                }
                Event::End(TagEnd::CodeBlock) => {
                    let html = match code_block_lang.as_deref() {
                        Some("mermaid") => render_mermaid(&code_block_content),
                        lang => self.highlight_code(&code_block_content, lang),
                    };
                    events.push(Event::Html(CowStr::from(html)));
                    in_code_block = false;
                    code_block_lang = None;
                }
                Event::Text(text) if in_code_block => {
                    code_block_content.push_str(&text);
                }
                Event::InlineMath(tex) => {
                    events.push(Event::InlineHtml(CowStr::from(format!(
                        r#"<span class="math math-inline">{}</span>"#,
                        escape_html(&tex)
                    ))));
                }
                Event::DisplayMath(tex) => {
                    events.push(Event::Html(CowStr::from(format!(
                        r#"<div class="math math-display">{}</div>"#,
                        escape_html(&tex)
                    ))));
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

        if !self.highlight {
            // Left for a client-side highlighter
            return format!(
                r#"<pre><code class="language-{}">{}</code></pre>"#,
                escape_html(lang),
                escape_html(code)
            );
        }

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
            Some(highlighted) if self.line_numbers => add_line_numbers(&highlighted, lang),
            Some(highlighted) => format!(
                r#"<div class="highlight language-{}">{}</div>"#,
                escape_html(lang),
                highlighted
            ),
            None => format!(
                r#"<pre><code class="language-{}">{}</code></pre>"#,
                escape_html(lang),
                escape_html(code)
            ),
        }
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Front-matter extraction followed by a markdown-to-HTML transform
pub fn process_markdown(source: &str) -> Result<ProcessedMarkdown> {
    MarkdownRenderer::new().process(source)
}

/// Mermaid diagrams are drawn in the browser
fn render_mermaid(source: &str) -> String {
    format!(r#"<pre class="mermaid">{}</pre>"#, escape_html(source))
}

/// Add line numbers to highlighted code
fn add_line_numbers(code: &str, lang: &str) -> String {
    let lines: Vec<&str> = code.lines().collect();

    let gutter = (1..=lines.len())
        .map(|n| format!(r#"<span class="line-number">{}</span>"#, n))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"<figure class="highlight {}"><table><tr><td class="gutter"><pre>{}</pre></td><td class="code">{}</td></tr></table></figure>"#,
        escape_html(lang),
        gutter,
        lines.join("\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_basic_markdown() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("# Hello World\n\nThis is a test.").unwrap();
        assert!(html.contains("<h1>Hello World</h1>"));
        assert!(html.contains("<p>This is a test.</p>"));
    }

    #[test]
    fn test_render_code_block() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("```rust\nfn main() {}\n```").unwrap();
        assert!(html.contains(r#"class="highlight language-rust""#));
        assert!(html.contains("main"));
    }

    #[test]
    fn test_unknown_language_falls_back() {
        let renderer = MarkdownRenderer::new();
        let html = renderer
            .render("```nosuchlang\nlet x = 1;\n```")
            .unwrap();
        assert!(html.contains("language-nosuchlang"));
        assert!(html.contains("let x"));
    }

    #[test]
    fn test_client_side_highlighting() {
        let renderer = MarkdownRenderer::with_options(&HighlightConfig {
            enable: false,
            ..Default::default()
        });
        let html = renderer
            .render("```solidity\nif (a < b) {}\n```")
            .unwrap();
        assert!(html.contains(r#"<pre><code class="language-solidity">"#));
        assert!(html.contains("a &lt; b"));
    }

    #[test]
    fn test_indented_code_block() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("para\n\n    indented code\n").unwrap();
        assert!(html.contains("indented code"));
        assert!(html.contains("language-text"));
    }

    #[test]
    fn test_mermaid_block() {
        let renderer = MarkdownRenderer::new();
        let html = renderer
            .render("```mermaid\ngraph TD; A-->B;\n```")
            .unwrap();
        assert!(html.contains(r#"<pre class="mermaid">graph TD; A--&gt;B;"#));
    }

    #[test]
    fn test_math() {
        let renderer = MarkdownRenderer::new();
        let html = renderer
            .render("Inline $a < b$ here.\n\n$$\nx^2\n$$\n")
            .unwrap();
        assert!(html.contains(r#"<span class="math math-inline">a &lt; b</span>"#));
        assert!(html.contains(r#"<div class="math math-display">"#));
        assert!(html.contains("x^2"));
    }

    #[test]
    fn test_table() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("| a | b |\n|---|---|\n| 1 | 2 |\n").unwrap();
        assert!(html.contains("<table>"));
        assert!(html.contains("<td>2</td>"));
    }

    #[test]
    fn test_process_markdown() {
        let processed = process_markdown("---\ntitle: Hi\n---\n*em*\n").unwrap();
        assert_eq!(processed.front_matter.title.as_deref(), Some("Hi"));
        assert!(processed.content.contains("<em>em</em>"));
    }
}
