use std::fmt;

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use crate::block::{Alignment, Block, Column, List, ListItem, Row, Span};

/// A problem that makes the template unparseable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Byte offset into the template text
    pub offset: usize,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at byte {}", self.message, self.offset)
    }
}

/// Elements that never take a closing tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Strip YAML frontmatter from the beginning of markdown content.
///
/// The block must open with a `---` line, hold `key: value` lines with no
/// blank line among them, and close with a `---` line. Anything else is
/// ordinary Markdown, such as a leading thematic break.
fn strip_frontmatter(markdown: &str) -> &str {
    let Some(rest) = markdown
        .strip_prefix("---\n")
        .or_else(|| markdown.strip_prefix("---\r\n"))
    else {
        return markdown;
    };

    let mut consumed = 0;
    for (i, line) in rest.split_inclusive('\n').enumerate() {
        let content = line.trim_end();
        if content == "---" {
            if i == 0 {
                return markdown;
            }
            return rest[consumed + line.len()..].trim_start_matches(['\r', '\n']);
        }
        if content.is_empty() || (i == 0 && !content.contains(':')) {
            return markdown;
        }
        consumed += line.len();
    }
    markdown
}

/// Parse markdown text into a list of blocks
pub fn parse(markdown: &str) -> Result<Vec<Block>, Vec<Diagnostic>> {
    let body = strip_frontmatter(markdown);
    parse_body(body, markdown.len() - body.len())
}

/// Parse `body`, reporting diagnostics `base` bytes further into the template
fn parse_body(body: &str, base: usize) -> Result<Vec<Block>, Vec<Diagnostic>> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(body, options).into_offset_iter();
    let mut blocks = Vec::new();
    let mut state = ParseState::default();

    for (event, range) in parser {
        process_event(event, base + range.start, &mut state, &mut blocks);
    }
    state.close_unterminated();

    if state.diagnostics.is_empty() {
        Ok(blocks)
    } else {
        tracing::debug!(count = state.diagnostics.len(), "template rejected");
        Err(state.diagnostics)
    }
}

#[derive(Default)]
struct ParseState {
    // Current inline content being built
    spans: Vec<Span>,
    // Stack for nested inline containers (emphasis, links, ...)
    inline_stack: Vec<InlineKind>,
    // Nested span buffers for inline containers
    span_stack: Vec<Vec<Span>>,

    // Current heading level (if in a heading)
    heading_level: Option<u8>,

    // Code block state
    in_code_block: bool,
    code_language: Option<String>,
    code_content: String,

    // Raw HTML block state
    in_html_block: bool,
    html_content: String,
    html_offset: usize,

    // Open block quotes and HTML elements, innermost last
    containers: Vec<Container>,

    // List state
    list_stack: Vec<ListBuilder>,

    // Table state
    in_table: bool,
    table_alignments: Vec<Alignment>,
    table_headers: Vec<Column>,
    table_rows: Vec<Row>,
    current_row: Row,
    in_table_head: bool,

    diagnostics: Vec<Diagnostic>,
}

enum InlineKind {
    Emphasis,
    Strong,
    Strikethrough,
    Link { url: String, title: String },
    Image { url: String, title: String },
}

struct Container {
    kind: ContainerKind,
    offset: usize,
    children: Vec<Block>,
}

enum ContainerKind {
    BlockQuote,
    Element { tag: String, attributes: String },
}

struct ListBuilder {
    start: Option<u64>,
    items: Vec<ListItem>,
    current_item_spans: Vec<Span>,
    current_item_checked: Option<bool>,
    current_item_nested: Option<Box<List>>,
}

impl ParseState {
    /// Route a finished block into the innermost open container
    fn emit(&mut self, block: Block, blocks: &mut Vec<Block>) {
        match self.containers.last_mut() {
            Some(container) => container.children.push(block),
            None => blocks.push(block),
        }
    }

    fn push_text(&mut self, text: &str) {
        // Adjacent text events are merged so placeholders are never split
        if let Some(Span::Text(last)) = self.spans.last_mut() {
            last.push_str(text);
        } else {
            self.spans.push(Span::Text(text.to_string()));
        }
    }

    fn open_inline(&mut self, kind: InlineKind) {
        self.inline_stack.push(kind);
        self.span_stack.push(std::mem::take(&mut self.spans));
    }

    fn close_inline(&mut self) {
        let content = std::mem::take(&mut self.spans);
        let (Some(kind), Some(mut parent)) = (self.inline_stack.pop(), self.span_stack.pop()) else {
            return;
        };
        parent.push(match kind {
            InlineKind::Emphasis => Span::Emphasis(content),
            InlineKind::Strong => Span::Strong(content),
            InlineKind::Strikethrough => Span::Strikethrough(content),
            InlineKind::Link { url, title } => Span::Link { url, title, content },
            InlineKind::Image { url, title } => Span::Image {
                url,
                title,
                alt: content,
            },
        });
        self.spans = parent;
    }

    fn finish_html_block(&mut self, blocks: &mut Vec<Block>) {
        let raw = std::mem::take(&mut self.html_content);
        let offset = self.html_offset;
        match classify_html(&raw) {
            HtmlBlock::Open { tag, attributes } => {
                self.containers.push(Container {
                    kind: ContainerKind::Element { tag, attributes },
                    offset,
                    children: Vec::new(),
                });
            }
            HtmlBlock::Close { tag } => self.close_element(&tag, offset, raw, blocks),
            HtmlBlock::Wrapped {
                tag,
                attributes,
                inner,
                inner_start,
                inline,
            } => match parse_body(&inner, offset + inner_start) {
                Ok(children) => self.emit(
                    Block::HtmlElement {
                        tag,
                        attributes,
                        inline,
                        children,
                    },
                    blocks,
                ),
                // Content that does not parse on its own keeps the block raw
                Err(_) => self.emit(Block::Html(raw), blocks),
            },
            HtmlBlock::Raw => self.emit(Block::Html(raw), blocks),
        }
    }

    fn close_element(&mut self, tag: &str, offset: usize, raw: String, blocks: &mut Vec<Block>) {
        let open_tag = match self.containers.last() {
            Some(Container {
                kind: ContainerKind::Element { tag: open, .. },
                ..
            }) => Some(open.clone()),
            _ => None,
        };
        match open_tag {
            Some(open) if open.eq_ignore_ascii_case(tag) => {
                if let Some(Container {
                    kind: ContainerKind::Element { tag, attributes },
                    children,
                    ..
                }) = self.containers.pop()
                {
                    self.emit(
                        Block::HtmlElement {
                            tag,
                            attributes,
                            inline: false,
                            children,
                        },
                        blocks,
                    );
                }
            }
            Some(open) => {
                self.diagnostics.push(Diagnostic {
                    offset,
                    message: format!("closing tag </{tag}> does not match open <{open}> element"),
                });
                self.emit(Block::Html(raw), blocks);
            }
            None => {
                self.diagnostics.push(Diagnostic {
                    offset,
                    message: format!("closing tag </{tag}> has no open element"),
                });
                self.emit(Block::Html(raw), blocks);
            }
        }
    }

    fn report_unclosed(&mut self, container: &Container) {
        if let ContainerKind::Element { tag, .. } = &container.kind {
            self.diagnostics.push(Diagnostic {
                offset: container.offset,
                message: format!("unclosed <{tag}> element"),
            });
        }
    }

    fn close_block_quote(&mut self, blocks: &mut Vec<Block>) {
        while let Some(container) = self.containers.pop() {
            if let ContainerKind::BlockQuote = container.kind {
                self.emit(Block::BlockQuote(container.children), blocks);
                return;
            }
            self.report_unclosed(&container);
        }
    }

    fn close_unterminated(&mut self) {
        while let Some(container) = self.containers.pop() {
            self.report_unclosed(&container);
        }
    }
}

fn process_event(event: Event, offset: usize, state: &mut ParseState, blocks: &mut Vec<Block>) {
    match event {
        // Headings
        Event::Start(Tag::Heading { level, .. }) => {
            state.heading_level = Some(heading_level_to_u8(level));
        }
        Event::End(TagEnd::Heading(_)) => {
            if let Some(level) = state.heading_level.take() {
                let content = std::mem::take(&mut state.spans);
                state.emit(Block::Heading { level, content }, blocks);
            }
        }

        // Paragraphs
        Event::Start(Tag::Paragraph) => {}
        Event::End(TagEnd::Paragraph) => {
            let content = std::mem::take(&mut state.spans);
            if !content.is_empty() {
                // If we're in a list item, add to that instead
                if let Some(list) = state.list_stack.last_mut() {
                    list.current_item_spans.extend(content);
                } else if !state.in_table {
                    state.emit(Block::Paragraph { content }, blocks);
                }
            }
        }

        // Text content
        Event::Text(text) => {
            if state.in_code_block {
                state.code_content.push_str(&text);
            } else {
                state.push_text(&text);
            }
        }

        // Inline code
        Event::Code(code) => {
            state.spans.push(Span::Code(code.into_string()));
        }

        Event::Start(Tag::Strong) => state.open_inline(InlineKind::Strong),
        Event::Start(Tag::Emphasis) => state.open_inline(InlineKind::Emphasis),
        Event::Start(Tag::Strikethrough) => state.open_inline(InlineKind::Strikethrough),
        Event::Start(Tag::Link {
            dest_url, title, ..
        }) => state.open_inline(InlineKind::Link {
            url: dest_url.into_string(),
            title: title.into_string(),
        }),
        Event::Start(Tag::Image {
            dest_url, title, ..
        }) => state.open_inline(InlineKind::Image {
            url: dest_url.into_string(),
            title: title.into_string(),
        }),
        Event::End(
            TagEnd::Strong | TagEnd::Emphasis | TagEnd::Strikethrough | TagEnd::Link | TagEnd::Image,
        ) => state.close_inline(),

        // Raw HTML
        Event::InlineHtml(html) => {
            state.spans.push(Span::Html(html.into_string()));
        }
        Event::Start(Tag::HtmlBlock) => {
            state.in_html_block = true;
            state.html_offset = offset;
            state.html_content.clear();
        }
        Event::Html(html) => {
            if state.in_html_block {
                state.html_content.push_str(&html);
            } else {
                state.emit(Block::Html(html.into_string()), blocks);
            }
        }
        Event::End(TagEnd::HtmlBlock) => {
            state.in_html_block = false;
            state.finish_html_block(blocks);
        }

        // Block quotes
        Event::Start(Tag::BlockQuote(_)) => {
            state.containers.push(Container {
                kind: ContainerKind::BlockQuote,
                offset,
                children: Vec::new(),
            });
        }
        Event::End(TagEnd::BlockQuote(_)) => state.close_block_quote(blocks),

        // Code blocks
        Event::Start(Tag::CodeBlock(kind)) => {
            state.in_code_block = true;
            state.code_language = match kind {
                pulldown_cmark::CodeBlockKind::Fenced(lang) => {
                    let lang = lang.into_string();
                    if lang.is_empty() { None } else { Some(lang) }
                }
                pulldown_cmark::CodeBlockKind::Indented => None,
            };
            state.code_content.clear();
        }
        Event::End(TagEnd::CodeBlock) => {
            state.in_code_block = false;
            let content = std::mem::take(&mut state.code_content);
            let language = state.code_language.take();
            state.emit(Block::CodeBlock { language, content }, blocks);
        }

        // Lists
        Event::Start(Tag::List(first_item)) => {
            state.list_stack.push(ListBuilder {
                start: first_item,
                items: Vec::new(),
                current_item_spans: Vec::new(),
                current_item_checked: None,
                current_item_nested: None,
            });
        }
        Event::End(TagEnd::List(_)) => {
            if let Some(list_builder) = state.list_stack.pop() {
                let list = List {
                    start: list_builder.start,
                    items: list_builder.items,
                };
                // If there's a parent list, this is nested in its open item
                if let Some(parent) = state.list_stack.last_mut() {
                    parent.current_item_nested = Some(Box::new(list));
                } else {
                    state.emit(Block::List(list), blocks);
                }
            }
        }

        Event::Start(Tag::Item) => {
            // Spans of a parent item written before a nested list
            let leading = std::mem::take(&mut state.spans);
            if let Some(list) = state.list_stack.last_mut() {
                list.current_item_spans.clear();
                list.current_item_checked = None;
                list.current_item_nested = None;
            }
            if !leading.is_empty() {
                let depth = state.list_stack.len();
                if depth >= 2 {
                    state.list_stack[depth - 2].current_item_spans.extend(leading);
                }
            }
        }
        Event::End(TagEnd::Item) => {
            // Collect any remaining spans
            let remaining = std::mem::take(&mut state.spans);

            if let Some(list) = state.list_stack.last_mut() {
                list.current_item_spans.extend(remaining);
                let content = std::mem::take(&mut list.current_item_spans);
                let checked = list.current_item_checked.take();
                let nested = list.current_item_nested.take();
                list.items.push(ListItem {
                    content,
                    nested,
                    checked,
                });
            }
        }

        // Task list checkboxes
        Event::TaskListMarker(checked) => {
            if let Some(list) = state.list_stack.last_mut() {
                list.current_item_checked = Some(checked);
            }
        }

        // Tables
        Event::Start(Tag::Table(alignments)) => {
            state.in_table = true;
            state.table_alignments = alignments.into_iter().map(convert_alignment).collect();
            state.table_headers.clear();
            state.table_rows.clear();
        }
        Event::End(TagEnd::Table) => {
            state.in_table = false;
            let headers = std::mem::take(&mut state.table_headers);
            let rows = std::mem::take(&mut state.table_rows);
            state.emit(Block::Table { headers, rows }, blocks);
        }

        Event::Start(Tag::TableHead) => {
            state.in_table_head = true;
            state.current_row.clear();
        }
        Event::End(TagEnd::TableHead) => {
            state.in_table_head = false;
            let labels = std::mem::take(&mut state.current_row);
            state.table_headers = labels
                .into_iter()
                .enumerate()
                .map(|(i, label)| Column {
                    label,
                    alignment: state.table_alignments.get(i).copied().unwrap_or_default(),
                })
                .collect();
        }

        Event::Start(Tag::TableRow) => {
            state.current_row.clear();
        }
        Event::End(TagEnd::TableRow) => {
            if !state.in_table_head {
                let row = std::mem::take(&mut state.current_row);
                state.table_rows.push(row);
            }
        }

        Event::Start(Tag::TableCell) => {
            state.spans.clear();
        }
        Event::End(TagEnd::TableCell) => {
            let cell_content = std::mem::take(&mut state.spans);
            state.current_row.push(cell_content);
        }

        // Horizontal rule
        Event::Rule => {
            state.emit(Block::Rule, blocks);
        }

        // Soft/hard breaks
        Event::SoftBreak => {
            state.spans.push(Span::SoftBreak);
        }
        Event::HardBreak => {
            state.spans.push(Span::LineBreak);
        }

        // Ignore other events
        _ => {}
    }
}

enum HtmlBlock {
    Open {
        tag: String,
        attributes: String,
    },
    Close {
        tag: String,
    },
    /// `<tag attrs>inner</tag>` in a single block
    Wrapped {
        tag: String,
        attributes: String,
        inner: String,
        /// Byte offset of `inner` within the raw block
        inner_start: usize,
        inline: bool,
    },
    Raw,
}

/// Decide whether a raw HTML block opens, closes or wholly wraps an element.
fn classify_html(raw: &str) -> HtmlBlock {
    let lead = raw.len() - raw.trim_start().len();
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix('<') else {
        return HtmlBlock::Raw;
    };
    let Some(gt) = rest.find('>') else {
        return HtmlBlock::Raw;
    };
    let (head, after) = (&rest[..gt], &rest[gt + 1..]);
    if head.contains(['<', '\n']) {
        return HtmlBlock::Raw;
    }

    if let Some(name) = head.strip_prefix('/') {
        let tag = name.trim_end();
        if after.is_empty() && is_tag_name(tag) {
            return HtmlBlock::Close {
                tag: tag.to_ascii_lowercase(),
            };
        }
        return HtmlBlock::Raw;
    }

    let Some((tag, attributes)) = split_open_tag(head) else {
        return HtmlBlock::Raw;
    };
    if after.is_empty() {
        return HtmlBlock::Open { tag, attributes };
    }

    let inner = after.strip_suffix('>').and_then(|body| {
        let close = body.rfind("</")?;
        body[close + 2..]
            .trim_end()
            .eq_ignore_ascii_case(&tag)
            .then_some(&body[..close])
    });
    match inner {
        Some(inner) => HtmlBlock::Wrapped {
            inline: !trimmed.contains('\n'),
            inner: inner.to_string(),
            inner_start: lead + gt + 2,
            tag,
            attributes,
        },
        None => HtmlBlock::Raw,
    }
}

/// Split `name attrs` from an opening tag; void and self-closing tags yield None.
fn split_open_tag(head: &str) -> Option<(String, String)> {
    if head.ends_with('/') {
        return None;
    }
    let name_len = head
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
        .unwrap_or(head.len());
    let (tag, attributes) = head.split_at(name_len);
    if !is_tag_name(tag) || !(attributes.is_empty() || attributes.starts_with(char::is_whitespace))
    {
        return None;
    }
    let tag = tag.to_ascii_lowercase();
    if VOID_ELEMENTS.contains(&tag.as_str()) {
        return None;
    }
    Some((tag, attributes.trim().to_string()))
}

fn is_tag_name(name: &str) -> bool {
    name.starts_with(|c: char| c.is_ascii_alphabetic())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

fn convert_alignment(alignment: pulldown_cmark::Alignment) -> Alignment {
    match alignment {
        pulldown_cmark::Alignment::None => Alignment::None,
        pulldown_cmark::Alignment::Left => Alignment::Left,
        pulldown_cmark::Alignment::Center => Alignment::Center,
        pulldown_cmark::Alignment::Right => Alignment::Right,
    }
}

fn heading_level_to_u8(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}
