use crate::block::{Alignment, Block, Column, List, Row, Span};
use crate::config::Config;
use crate::render::Renderer;

/// Renders Typst markup, styled by the `[links]`, `[page]` and `[font]` config.
#[derive(Debug, Default)]
pub struct TypstRenderer {
    pub config: Config,
}

impl TypstRenderer {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl Renderer for TypstRenderer {
    type Output = String;

    fn render(&self, blocks: &[Block]) -> Result<String, String> {
        Ok(blocks_to_typst(blocks, &self.config))
    }
}

/// Convert blocks to Typst markup
pub fn blocks_to_typst(blocks: &[Block], config: &Config) -> String {
    let mut out = preamble(config);
    emit_blocks(blocks, &mut out);
    out
}

fn preamble(config: &Config) -> String {
    let mut rules = vec!["#set par(linebreaks: \"optimized\")".to_string()];
    if config.font.sans {
        rules.push(format!(
            "#set text(font: \"{}\")",
            escape_string(&config.font.family)
        ));
    }
    if config.page.numbers {
        rules.push("#set page(numbering: \"1\")".to_string());
    }
    rules.push(format!(
        "#show link: set text(fill: rgb(\"{}\"))",
        escape_string(&config.links.color)
    ));
    if config.links.underline {
        rules.push("#show link: underline".to_string());
    }
    rules.join("\n") + "\n\n"
}

fn emit_blocks(blocks: &[Block], out: &mut String) {
    let mut rest = blocks;
    while let Some((block, tail)) = rest.split_first() {
        rest = tail;
        if !matches!(block, Block::Heading { .. }) {
            emit_block(block, out);
            continue;
        }
        // A heading shares an unbreakable block with what follows it
        out.push_str("#block(breakable: false)[\n");
        emit_block(block, out);
        if let Some((next, tail)) = rest.split_first() {
            emit_block(next, out);
            rest = tail;
        }
        out.push_str("]\n\n");
    }
}

fn emit_block(block: &Block, out: &mut String) {
    match block {
        Block::Heading { level, content } => {
            out.push_str(&"=".repeat(usize::from(*level)));
            out.push(' ');
            spans_to_typst(content, out);
            out.push_str("\n\n");
        }
        Block::Paragraph { content } => {
            spans_to_typst(content, out);
            out.push_str("\n\n");
        }
        Block::CodeBlock { language, content } => {
            let newline = if content.ends_with('\n') { "" } else { "\n" };
            out.push_str(&format!(
                "#block(breakable: false)[\n```{}\n{content}{newline}```\n]\n\n",
                language.as_deref().unwrap_or_default()
            ));
        }
        Block::List(list) => {
            list_to_typst(list, 0, out);
            out.push('\n');
        }
        Block::Table { headers, rows } => {
            out.push_str("#block(breakable: false)[\n");
            table_to_typst(headers, rows, out);
            out.push_str("]\n\n");
        }
        Block::BlockQuote(children) => {
            out.push_str("#quote(block: true)[\n");
            emit_blocks(children, out);
            out.push_str("]\n\n");
        }
        // Markup has no Typst equivalent; only the Markdown inside an element renders
        Block::HtmlElement { children, .. } => emit_blocks(children, out),
        Block::Html(_) => {}
        Block::Rule => out.push_str("#line(length: 100%)\n\n"),
    }
}

fn spans_to_typst(spans: &[Span], out: &mut String) {
    for span in spans {
        span_to_typst(span, out);
    }
}

fn wrap_spans(open: &str, inner: &[Span], close: &str, out: &mut String) {
    out.push_str(open);
    spans_to_typst(inner, out);
    out.push_str(close);
}

fn span_to_typst(span: &Span, out: &mut String) {
    match span {
        Span::Text(text) => escape_markup(text, out),
        Span::Strong(inner) => wrap_spans("*", inner, "*", out),
        Span::Emphasis(inner) => wrap_spans("_", inner, "_", out),
        Span::Strikethrough(inner) => wrap_spans("#strike[", inner, "]", out),
        Span::Link { url, content, .. } => {
            let open = format!("#link(\"{}\")[", escape_string(url));
            wrap_spans(&open, content, "]", out);
        }
        // Remote images cannot be embedded; keep the description
        Span::Image { alt, .. } => spans_to_typst(alt, out),
        Span::Code(code) => {
            out.push('`');
            out.push_str(&code.replace('`', "\\`"));
            out.push('`');
        }
        Span::Html(_) => {}
        Span::SoftBreak => out.push('\n'),
        Span::LineBreak => out.push_str(" \\\n"),
    }
}

/// Characters with a meaning in Typst markup
const MARKUP_CHARS: &[char] = &['#', '*', '_', '@', '$', '\\', '`', '<', '>', '[', ']', '~'];

fn escape_markup(text: &str, out: &mut String) {
    for ch in text.chars() {
        if MARKUP_CHARS.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
}

fn escape_string(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

fn list_to_typst(list: &List, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    for (i, item) in list.items.iter().enumerate() {
        // Explicit numbers keep a list's own start
        let marker = match list.start {
            Some(start) => format!("{}.", start + i as u64),
            None => "-".to_string(),
        };
        let checkbox = match item.checked {
            Some(true) => "☑ ",
            Some(false) => "☐ ",
            None => "",
        };
        out.push_str(&format!("{indent}{marker} {checkbox}"));
        spans_to_typst(&item.content, out);
        out.push('\n');
        if let Some(nested) = &item.nested {
            list_to_typst(nested, depth + 1, out);
        }
    }
}

fn table_to_typst(headers: &[Column], rows: &[Row], out: &mut String) {
    let width = headers.len();
    if width == 0 {
        return;
    }

    out.push_str(&format!("#table(\n  columns: {width},\n"));
    if headers.iter().any(|c| c.alignment != Alignment::None) {
        let aligns: Vec<&str> = headers.iter().map(|c| typst_alignment(c.alignment)).collect();
        out.push_str(&format!("  align: ({}),\n", aligns.join(", ")));
    }

    for column in headers {
        wrap_spans("  [*", &column.label, "*],\n", out);
    }
    for row in rows {
        for cell in row {
            wrap_spans("  [", cell, "],\n", out);
        }
        for _ in row.len()..width {
            out.push_str("  [],\n");
        }
    }
    out.push_str(")\n");
}

fn typst_alignment(alignment: Alignment) -> &'static str {
    match alignment {
        Alignment::None => "auto",
        Alignment::Left => "left",
        Alignment::Center => "center",
        Alignment::Right => "right",
    }
}
