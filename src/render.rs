use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, LinkType, Tag, TagEnd, html};

use crate::block::{Alignment, Block, List, Span};

/// Turns a filled block tree into final output
pub trait Renderer {
    type Output;

    fn render(&self, blocks: &[Block]) -> Result<Self::Output, String>;
}

/// Renders HTML through pulldown-cmark's HTML writer.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlRenderer;

impl Renderer for HtmlRenderer {
    type Output = String;

    fn render(&self, blocks: &[Block]) -> Result<String, String> {
        let mut events = Vec::new();
        lower_blocks(blocks, &mut events)?;
        let mut out = String::new();
        html::push_html(&mut out, events.into_iter());
        Ok(out)
    }
}

fn lower_blocks<'a>(blocks: &'a [Block], events: &mut Vec<Event<'a>>) -> Result<(), String> {
    for block in blocks {
        lower_block(block, events)?;
    }
    Ok(())
}

fn lower_block<'a>(block: &'a Block, events: &mut Vec<Event<'a>>) -> Result<(), String> {
    match block {
        Block::Heading { level, content } => {
            let level = u8_to_heading_level(*level)?;
            events.push(Event::Start(Tag::Heading {
                level,
                id: None,
                classes: Vec::new(),
                attrs: Vec::new(),
            }));
            lower_spans(content, events);
            events.push(Event::End(TagEnd::Heading(level)));
        }
        Block::Paragraph { content } => {
            events.push(Event::Start(Tag::Paragraph));
            lower_spans(content, events);
            events.push(Event::End(TagEnd::Paragraph));
        }
        Block::Table { headers, rows } => {
            let width = headers.len();
            let alignments = headers
                .iter()
                .map(|column| convert_alignment(column.alignment))
                .collect();
            events.push(Event::Start(Tag::Table(alignments)));
            events.push(Event::Start(Tag::TableHead));
            for column in headers {
                lower_cell(&column.label, events);
            }
            events.push(Event::End(TagEnd::TableHead));
            for (i, row) in rows.iter().enumerate() {
                if row.len() > width {
                    return Err(format!(
                        "table row {} has {} cells but the table has {} columns",
                        i + 1,
                        row.len(),
                        width
                    ));
                }
                events.push(Event::Start(Tag::TableRow));
                for cell in row {
                    lower_cell(cell, events);
                }
                // Short rows are padded
                for _ in row.len()..width {
                    lower_cell(&[], events);
                }
                events.push(Event::End(TagEnd::TableRow));
            }
            events.push(Event::End(TagEnd::Table));
        }
        Block::HtmlElement {
            tag,
            attributes,
            inline,
            children,
        } => {
            if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
                return Err(format!("invalid HTML element name '{tag}'"));
            }
            let open = if attributes.is_empty() {
                format!("<{tag}>")
            } else {
                format!("<{tag} {attributes}>")
            };
            match children.as_slice() {
                // `<tag>content</tag>` stays on one line
                [] | [Block::Paragraph { .. }] if *inline => {
                    events.push(Event::Html(open.into()));
                    if let [Block::Paragraph { content }] = children.as_slice() {
                        lower_spans(content, events);
                    }
                    events.push(Event::Html(format!("</{tag}>\n").into()));
                }
                _ => {
                    events.push(Event::Html(format!("{open}\n").into()));
                    lower_blocks(children, events)?;
                    events.push(Event::Html(format!("</{tag}>\n").into()));
                }
            }
        }
        Block::CodeBlock { language, content } => {
            let lang = language.as_deref().unwrap_or_default();
            events.push(Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(lang.into()))));
            events.push(Event::Text(content.as_str().into()));
            events.push(Event::End(TagEnd::CodeBlock));
        }
        Block::List(list) => lower_list(list, events),
        Block::BlockQuote(children) => {
            events.push(Event::Start(Tag::BlockQuote(None)));
            lower_blocks(children, events)?;
            events.push(Event::End(TagEnd::BlockQuote(None)));
        }
        Block::Html(raw) => events.push(Event::Html(raw.as_str().into())),
        Block::Rule => events.push(Event::Rule),
    }
    Ok(())
}

fn lower_cell<'a>(spans: &'a [Span], events: &mut Vec<Event<'a>>) {
    events.push(Event::Start(Tag::TableCell));
    lower_spans(spans, events);
    events.push(Event::End(TagEnd::TableCell));
}

fn lower_list<'a>(list: &'a List, events: &mut Vec<Event<'a>>) {
    events.push(Event::Start(Tag::List(list.start)));
    for item in &list.items {
        events.push(Event::Start(Tag::Item));
        if let Some(checked) = item.checked {
            events.push(Event::TaskListMarker(checked));
        }
        lower_spans(&item.content, events);
        if let Some(nested) = &item.nested {
            lower_list(nested, events);
        }
        events.push(Event::End(TagEnd::Item));
    }
    events.push(Event::End(TagEnd::List(list.is_ordered())));
}

fn lower_spans<'a>(spans: &'a [Span], events: &mut Vec<Event<'a>>) {
    for span in spans {
        lower_span(span, events);
    }
}

fn lower_span<'a>(span: &'a Span, events: &mut Vec<Event<'a>>) {
    match span {
        Span::Text(text) => events.push(Event::Text(text.as_str().into())),
        Span::Emphasis(inner) => wrap(Tag::Emphasis, TagEnd::Emphasis, inner, events),
        Span::Strong(inner) => wrap(Tag::Strong, TagEnd::Strong, inner, events),
        Span::Strikethrough(inner) => {
            wrap(Tag::Strikethrough, TagEnd::Strikethrough, inner, events)
        }
        Span::Link {
            url,
            title,
            content,
        } => {
            let tag = Tag::Link {
                link_type: LinkType::Inline,
                dest_url: url.as_str().into(),
                title: title.as_str().into(),
                id: "".into(),
            };
            wrap(tag, TagEnd::Link, content, events);
        }
        Span::Image { url, title, alt } => {
            let tag = Tag::Image {
                link_type: LinkType::Inline,
                dest_url: url.as_str().into(),
                title: title.as_str().into(),
                id: "".into(),
            };
            wrap(tag, TagEnd::Image, alt, events);
        }
        Span::Code(code) => events.push(Event::Code(code.as_str().into())),
        Span::Html(raw) => events.push(Event::InlineHtml(raw.as_str().into())),
        Span::SoftBreak => events.push(Event::SoftBreak),
        Span::LineBreak => events.push(Event::HardBreak),
    }
}

fn wrap<'a>(start: Tag<'a>, end: TagEnd, inner: &'a [Span], events: &mut Vec<Event<'a>>) {
    events.push(Event::Start(start));
    lower_spans(inner, events);
    events.push(Event::End(end));
}

fn convert_alignment(alignment: Alignment) -> pulldown_cmark::Alignment {
    match alignment {
        Alignment::None => pulldown_cmark::Alignment::None,
        Alignment::Left => pulldown_cmark::Alignment::Left,
        Alignment::Center => pulldown_cmark::Alignment::Center,
        Alignment::Right => pulldown_cmark::Alignment::Right,
    }
}

fn u8_to_heading_level(level: u8) -> Result<HeadingLevel, String> {
    match level {
        1 => Ok(HeadingLevel::H1),
        2 => Ok(HeadingLevel::H2),
        3 => Ok(HeadingLevel::H3),
        4 => Ok(HeadingLevel::H4),
        5 => Ok(HeadingLevel::H5),
        6 => Ok(HeadingLevel::H6),
        other => Err(format!("invalid heading level {other}")),
    }
}
