/// Inline content inside headings, paragraphs, table cells and list items
#[derive(Debug, Clone, PartialEq)]
pub enum Span {
    Text(String),
    Emphasis(Vec<Span>),
    Strong(Vec<Span>),
    Strikethrough(Vec<Span>),
    Link {
        url: String,
        title: String,
        content: Vec<Span>,
    },
    Image {
        url: String,
        title: String,
        alt: Vec<Span>,
    },
    Code(String),
    /// Inline raw markup such as `<span>` or `</span>`, kept verbatim
    Html(String),
    /// A line ending inside a paragraph, rendered as a space or newline
    SoftBreak,
    LineBreak,
}

/// A single list item, which can contain nested content
#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    pub content: Vec<Span>,
    pub nested: Option<Box<List>>,
    /// For task lists: None = not a task, Some(false) = unchecked, Some(true) = checked
    pub checked: Option<bool>,
}

/// A list (ordered or unordered)
#[derive(Debug, Clone, PartialEq)]
pub struct List {
    /// Number of the first item; `None` for a bullet list
    pub start: Option<u64>,
    pub items: Vec<ListItem>,
}

impl List {
    pub fn is_ordered(&self) -> bool {
        self.start.is_some()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Alignment {
    #[default]
    None,
    Left,
    Center,
    Right,
}

/// Table column header
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub label: Vec<Span>,
    pub alignment: Alignment,
}

impl Column {
    pub fn new(label: Vec<Span>) -> Self {
        Self {
            label,
            alignment: Alignment::None,
        }
    }
}

/// One table row: a list of cells, each cell a list of spans
pub type Row = Vec<Vec<Span>>;

/// Block-level elements parsed from Markdown
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading {
        level: u8,
        content: Vec<Span>,
    },
    Paragraph {
        content: Vec<Span>,
    },
    Table {
        headers: Vec<Column>,
        rows: Vec<Row>,
    },
    /// An HTML element wrapping Markdown blocks, e.g. `<div>` ... `</div>`
    HtmlElement {
        tag: String,
        /// Raw attribute text between the tag name and `>`
        attributes: String,
        /// Written on one line as `<tag>content</tag>`
        inline: bool,
        children: Vec<Block>,
    },
    CodeBlock {
        language: Option<String>,
        content: String,
    },
    List(List),
    BlockQuote(Vec<Block>),
    /// Raw HTML that does not open or close an element wrapper
    Html(String),
    Rule,
}

impl Block {
    pub fn paragraph(text: &str) -> Self {
        Block::Paragraph {
            content: vec![Span::Text(text.to_string())],
        }
    }
}
