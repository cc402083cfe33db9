use pulldown_cmark::{CodeBlockKind, Event as MdEvent, Options, Parser, Tag, TagEnd};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

use crate::tui::Theme;

/// Renders assistant markdown into styled, word-wrapped lines.
///
/// Deliberately small: paragraphs, headings, bullet/numbered items, inline
/// emphasis and code, and fenced code blocks. Anything else degrades to
/// plain text rather than being dropped.
pub fn render(text: &str, theme: &Theme, width: usize) -> Vec<Line<'static>> {
    let mut renderer = Renderer::new(theme, width.max(10));
    for event in Parser::new_ext(text, Options::empty()) {
        renderer.handle(event);
    }
    renderer.finish()
}

struct Renderer {
    width: usize,
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    current_width: usize,
    needs_space: bool,
    bold: usize,
    italic: usize,
    heading: bool,
    quote: bool,
    code_block: bool,
    text_style: Style,
    heading_style: Style,
    quote_style: Style,
    code_style: Style,
    bullet_style: Style,
}

impl Renderer {
    fn new(theme: &Theme, width: usize) -> Self {
        Self {
            width,
            lines: Vec::new(),
            current: Vec::new(),
            current_width: 0,
            needs_space: false,
            bold: 0,
            italic: 0,
            heading: false,
            quote: false,
            code_block: false,
            text_style: Style::default().fg(theme.fg),
            heading_style: Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
            quote_style: Style::default()
                .fg(theme.secondary)
                .add_modifier(Modifier::ITALIC),
            code_style: Style::default().fg(theme.highlight),
            bullet_style: Style::default().fg(theme.accent),
        }
    }

    fn handle(&mut self, event: MdEvent) {
        match event {
            MdEvent::Start(Tag::Paragraph) => self.blank_line_between_blocks(),
            MdEvent::End(TagEnd::Paragraph) => self.flush(),

            MdEvent::Start(Tag::Heading { .. }) => {
                self.blank_line_between_blocks();
                self.heading = true;
            }
            MdEvent::End(TagEnd::Heading(_)) => {
                self.flush();
                self.heading = false;
            }

            MdEvent::Start(Tag::Item) => {
                self.flush();
                self.current.push(Span::styled("• ", self.bullet_style));
                self.current_width = 2;
            }
            MdEvent::End(TagEnd::Item) => self.flush(),

            MdEvent::Start(Tag::BlockQuote) => {
                self.blank_line_between_blocks();
                self.quote = true;
            }
            MdEvent::End(TagEnd::BlockQuote) => {
                self.flush();
                self.quote = false;
            }

            MdEvent::Start(Tag::CodeBlock(CodeBlockKind::Fenced(_)))
            | MdEvent::Start(Tag::CodeBlock(CodeBlockKind::Indented)) => {
                self.blank_line_between_blocks();
                self.code_block = true;
            }
            MdEvent::End(TagEnd::CodeBlock) => {
                self.flush();
                self.code_block = false;
            }

            MdEvent::Start(Tag::Strong) => self.bold += 1,
            MdEvent::End(TagEnd::Strong) => self.bold = self.bold.saturating_sub(1),
            MdEvent::Start(Tag::Emphasis) => self.italic += 1,
            MdEvent::End(TagEnd::Emphasis) => self.italic = self.italic.saturating_sub(1),

            MdEvent::Text(text) => {
                if self.code_block {
                    for line in text.lines() {
                        self.lines
                            .push(Line::from(Span::styled(line.to_string(), self.code_style)));
                    }
                } else {
                    self.push_words(&text);
                }
            }
            MdEvent::Code(code) => {
                let chunk = code.to_string();
                self.push_chunk(chunk, self.code_style);
            }

            MdEvent::SoftBreak => self.needs_space = true,
            MdEvent::HardBreak => self.flush(),
            MdEvent::Rule => {
                self.flush();
                self.lines.push(Line::from(Span::styled(
                    "─".repeat(self.width.min(20)),
                    self.quote_style,
                )));
            }

            _ => {}
        }
    }

    fn current_style(&self) -> Style {
        let mut style = if self.heading {
            self.heading_style
        } else if self.quote {
            self.quote_style
        } else {
            self.text_style
        };
        if self.bold > 0 {
            style = style.add_modifier(Modifier::BOLD);
        }
        if self.italic > 0 {
            style = style.add_modifier(Modifier::ITALIC);
        }
        style
    }

    fn push_words(&mut self, text: &str) {
        if text.starts_with(char::is_whitespace) {
            self.needs_space = true;
        }
        let style = self.current_style();
        let words: Vec<&str> = text.split_whitespace().collect();
        for word in words {
            self.push_chunk(word.to_string(), style);
        }
        if text.ends_with(char::is_whitespace) {
            self.needs_space = true;
        }
    }

    /// Appends one unbreakable chunk, wrapping first when it would not fit.
    fn push_chunk(&mut self, chunk: String, style: Style) {
        let chunk_width = chunk.width();
        let sep = if self.needs_space && self.current_width > 0 {
            1
        } else {
            0
        };

        if self.current_width > 0 && self.current_width + sep + chunk_width > self.width {
            self.flush();
        } else if sep == 1 {
            self.current.push(Span::raw(" "));
            self.current_width += 1;
        }

        self.current_width += chunk_width;
        self.current.push(Span::styled(chunk, style));
        self.needs_space = true;
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            let spans = std::mem::take(&mut self.current);
            self.lines.push(Line::from(spans));
        }
        self.current_width = 0;
        self.needs_space = false;
    }

    fn blank_line_between_blocks(&mut self) {
        self.flush();
        if !self.lines.is_empty() {
            self.lines.push(Line::from(""));
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush();
        self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn test_plain_paragraph() {
        let theme = Theme::dark();
        let lines = render("The file has 42 rows.", &theme, 80);
        assert_eq!(lines.len(), 1);
        assert_eq!(line_text(&lines[0]), "The file has 42 rows.");
    }

    #[test]
    fn test_wrapping_respects_width() {
        let theme = Theme::dark();
        let lines = render("alpha beta gamma delta epsilon", &theme, 12);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(line_text(line).len() <= 12, "line too wide: {:?}", line_text(line));
        }
        // No words are lost by wrapping.
        let joined: Vec<String> = lines.iter().map(|l| line_text(l)).collect();
        assert_eq!(joined.join(" ").split_whitespace().count(), 5);
    }

    #[test]
    fn test_inline_code_is_styled() {
        let theme = Theme::dark();
        let lines = render("run `head data.csv` locally", &theme, 80);
        assert_eq!(lines.len(), 1);
        assert_eq!(line_text(&lines[0]), "run head data.csv locally");
        let styled = lines[0]
            .spans
            .iter()
            .any(|span| span.style.fg == Some(theme.highlight));
        assert!(styled);
    }

    #[test]
    fn test_bullet_items() {
        let theme = Theme::dark();
        let lines = render("- first\n- second", &theme, 80);
        let texts: Vec<String> = lines.iter().map(|l| line_text(l)).collect();
        assert_eq!(texts, vec!["• first", "• second"]);
    }

    #[test]
    fn test_code_block_kept_verbatim() {
        let theme = Theme::dark();
        let lines = render("intro\n\n```\nSELECT *\nFROM t\n```", &theme, 80);
        let texts: Vec<String> = lines.iter().map(|l| line_text(l)).collect();
        assert!(texts.contains(&"SELECT *".to_string()));
        assert!(texts.contains(&"FROM t".to_string()));
    }

    #[test]
    fn test_paragraphs_separated_by_blank_line() {
        let theme = Theme::dark();
        let lines = render("one\n\ntwo", &theme, 80);
        let texts: Vec<String> = lines.iter().map(|l| line_text(l)).collect();
        assert_eq!(texts, vec!["one", "", "two"]);
    }
}
