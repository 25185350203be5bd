use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

use crate::icons;
use crate::utils::sanitize;

/// Convert an issue or comment body to styled lines.
///
/// Images and embedded media are shown as their raw source; terminal escapes
/// are stripped first.
pub fn markdown_to_lines(markdown: &str) -> Vec<Line<'static>> {
    let clean = sanitize(markdown);
    let mut renderer = Renderer::default();
    for event in Parser::new(&clean) {
        renderer.handle(event);
    }
    renderer.finish()
}

#[derive(Default)]
struct Renderer {
    lines: Vec<Line<'static>>,
    spans: Vec<Span<'static>>,
    text: String,
    bold: bool,
    italic: bool,
    heading: Option<Color>,
    in_code_block: bool,
    list_depth: usize,
    image: Option<(String, String)>,
}

impl Renderer {
    fn handle(&mut self, event: Event) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if let Some((alt, _)) = self.image.as_mut() {
                    alt.push_str(&text);
                } else if self.in_code_block {
                    for line in text.lines() {
                        self.lines.push(Line::styled(
                            format!("  {}", line),
                            Style::default().fg(Color::Gray),
                        ));
                    }
                } else {
                    self.text.push_str(&text);
                }
            }
            Event::Code(code) => {
                if self.image.is_none() {
                    self.flush_text();
                    self.spans.push(Span::styled(
                        format!("`{}`", code),
                        Style::default().fg(Color::Gray),
                    ));
                }
            }
            Event::SoftBreak | Event::HardBreak => {
                if !self.in_code_block && self.image.is_none() {
                    self.break_line();
                }
            }
            Event::Html(html) | Event::InlineHtml(html) => {
                let lower = html.to_lowercase();
                if ["<video", "<img", "<iframe"].iter().any(|t| lower.contains(t)) {
                    self.flush_text();
                    self.spans.push(Span::styled(
                        html.trim().to_string(),
                        Style::default().fg(Color::DarkGray),
                    ));
                }
            }
            Event::TaskListMarker(done) => {
                let marker = if done { icons::MARKED } else { icons::UNMARKED };
                self.spans.push(Span::raw(marker));
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag) {
        match tag {
            Tag::Heading { level, .. } => {
                self.break_line();
                if !self.lines.is_empty() {
                    self.lines.push(Line::raw(""));
                }
                self.bold = true;
                self.heading = Some(match level {
                    HeadingLevel::H1 => Color::Cyan,
                    HeadingLevel::H2 => Color::Green,
                    HeadingLevel::H3 => Color::Yellow,
                    _ => Color::Magenta,
                });
            }
            Tag::Paragraph => {
                if !self.spans.is_empty() || !self.text.is_empty() {
                    self.break_line();
                    self.lines.push(Line::raw(""));
                }
            }
            Tag::CodeBlock(_) => {
                self.break_line();
                self.in_code_block = true;
            }
            Tag::List(_) => {
                self.break_line();
                self.list_depth += 1;
            }
            Tag::Item => {
                self.flush_text();
                let indent = "  ".repeat(self.list_depth.saturating_sub(1));
                self.spans.push(Span::styled(
                    format!("{}{} ", indent, icons::BULLET),
                    Style::default().fg(Color::Yellow),
                ));
            }
            Tag::Strong => {
                self.flush_text();
                self.bold = true;
            }
            Tag::Emphasis => {
                self.flush_text();
                self.italic = true;
            }
            Tag::Link { .. } => self.flush_text(),
            Tag::Image { dest_url, .. } => {
                self.flush_text();
                self.image = Some((String::new(), dest_url.to_string()));
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Heading(_) => {
                self.flush_text();
                self.bold = false;
                self.heading = None;
                self.push_line();
                self.lines.push(Line::raw(""));
            }
            TagEnd::CodeBlock => {
                self.in_code_block = false;
                self.lines.push(Line::raw(""));
            }
            TagEnd::List(_) => {
                self.break_line();
                self.list_depth = self.list_depth.saturating_sub(1);
            }
            TagEnd::Paragraph | TagEnd::Item => self.break_line(),
            TagEnd::Strong => {
                self.flush_text();
                self.bold = false;
            }
            TagEnd::Emphasis => {
                self.flush_text();
                self.italic = false;
            }
            TagEnd::Link => self.flush_text(),
            TagEnd::Image => {
                if let Some((alt, url)) = self.image.take() {
                    self.spans.push(Span::styled(
                        format!("![{}]({})", alt, url),
                        Style::default().fg(Color::DarkGray),
                    ));
                }
            }
            _ => {}
        }
    }

    fn flush_text(&mut self) {
        if self.text.is_empty() {
            return;
        }
        let mut style = match self.heading {
            Some(color) => Style::default().fg(color),
            None => Style::default(),
        };
        if self.bold {
            style = style.add_modifier(Modifier::BOLD);
        }
        if self.italic {
            style = style.add_modifier(Modifier::ITALIC);
        }
        self.spans
            .push(Span::styled(std::mem::take(&mut self.text), style));
    }

    fn push_line(&mut self) {
        if !self.spans.is_empty() {
            self.lines.push(Line::from(std::mem::take(&mut self.spans)));
        }
    }

    fn break_line(&mut self) {
        self.flush_text();
        self.push_line();
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.break_line();
        while self.lines.last().is_some_and(|l| l.width() == 0) {
            self.lines.pop();
        }
        self.lines
    }
}
