//! Applying substitution across a parsed block tree.

use crate::bindings::Bindings;
use crate::block::{Block, Span};
use crate::config::TableConfig;
use crate::substitute::Substitution;
use crate::table;

/// Produce a new tree with every text-bearing leaf substituted.
///
/// Headings, paragraphs, tables and the children of HTML elements are
/// substituted. Code blocks, lists, block quotes, raw HTML and rules pass
/// through unchanged.
pub fn fill_blocks(blocks: &[Block], bindings: &Bindings, tables: &TableConfig) -> Vec<Block> {
    blocks
        .iter()
        .map(|block| fill_block(block, bindings, tables))
        .collect()
}

fn fill_block(block: &Block, bindings: &Bindings, tables: &TableConfig) -> Block {
    match block {
        Block::Heading { level, content } => Block::Heading {
            level: *level,
            content: fill_spans(content, &mut Substitution::new(bindings)),
        },
        Block::Paragraph { content } => Block::Paragraph {
            content: fill_spans(content, &mut Substitution::new(bindings)),
        },
        Block::Table { headers, rows } => table::fill_table(headers, rows, bindings, tables),
        Block::HtmlElement {
            tag,
            attributes,
            inline,
            children,
        } => Block::HtmlElement {
            tag: tag.clone(),
            attributes: attributes.clone(),
            inline: *inline,
            children: fill_blocks(children, bindings, tables),
        },
        Block::CodeBlock { .. }
        | Block::List(_)
        | Block::BlockQuote(_)
        | Block::Html(_)
        | Block::Rule => block.clone(),
    }
}

pub fn fill_spans(spans: &[Span], subst: &mut Substitution<'_>) -> Vec<Span> {
    spans.iter().map(|span| fill_span(span, subst)).collect()
}

fn fill_span(span: &Span, subst: &mut Substitution<'_>) -> Span {
    match span {
        Span::Text(text) => Span::Text(subst.text(text)),
        Span::Emphasis(inner) => Span::Emphasis(fill_spans(inner, subst)),
        Span::Strong(inner) => Span::Strong(fill_spans(inner, subst)),
        Span::Strikethrough(inner) => Span::Strikethrough(fill_spans(inner, subst)),
        Span::Link {
            url,
            title,
            content,
        } => Span::Link {
            url: subst.url(url),
            title: title.clone(),
            content: fill_spans(content, subst),
        },
        // Image sources are substituted without brace escaping
        Span::Image { url, title, alt } => Span::Image {
            url: subst.text(url),
            title: title.clone(),
            alt: fill_spans(alt, subst),
        },
        Span::Code(code) => Span::Code(subst.text(code)),
        Span::Html(_) | Span::SoftBreak | Span::LineBreak => span.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{List, ListItem};
    use crate::parser;

    fn fill(markdown: &str, bindings: &Bindings) -> Vec<Block> {
        let blocks = parser::parse(markdown).unwrap();
        fill_blocks(&blocks, bindings, &TableConfig::default())
    }

    fn text(s: &str) -> Span {
        Span::Text(s.to_string())
    }

    #[test]
    fn heading_keeps_level() {
        let bindings = Bindings::from_iter([("title", "Cities")]);
        assert_eq!(
            fill("### {title}", &bindings),
            vec![Block::Heading {
                level: 3,
                content: vec![text("Cities")],
            }]
        );
    }

    #[test]
    fn nested_inlines_are_substituted() {
        let bindings = Bindings::from_iter([("a", "A"), ("b", "B"), ("c", "C"), ("d", "D")]);
        assert_eq!(
            fill("*{a}* **{b} ~~{c}~~** `{d}`", &bindings),
            vec![Block::Paragraph {
                content: vec![
                    Span::Emphasis(vec![text("A")]),
                    text(" "),
                    Span::Strong(vec![text("B "), Span::Strikethrough(vec![text("C")])]),
                    text(" "),
                    Span::Code("D".to_string()),
                ],
            }]
        );
    }

    #[test]
    fn link_targets_are_escaped_image_sources_are_not() {
        let bindings = Bindings::from_iter([("slug", "a{b}"), ("id", "7"), ("name", "Seven")]);
        let blocks = fill("[{name}](/p/%7Bslug%7D) ![{name}](/i/{id}-{slug}.png)", &bindings);
        let Block::Paragraph { content } = &blocks[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(
            content[0],
            Span::Link {
                url: "/p/a%7Bb%7D".to_string(),
                title: String::new(),
                content: vec![text("Seven")],
            }
        );
        assert_eq!(
            content[2],
            Span::Image {
                url: "/i/7-a{b}.png".to_string(),
                title: String::new(),
                alt: vec![text("Seven")],
            }
        );
    }

    #[test]
    fn html_element_children_are_walked() {
        let bindings = Bindings::from_iter([("x", "filled")]);
        assert_eq!(
            fill("<aside>\n\n{x}\n\n</aside>\n", &bindings),
            vec![Block::HtmlElement {
                tag: "aside".to_string(),
                attributes: String::new(),
                inline: false,
                children: vec![Block::paragraph("filled")],
            }]
        );
    }

    #[test]
    fn one_line_element_content_is_walked() {
        let bindings = Bindings::from_iter([("title", "Hello")]);
        assert_eq!(
            fill("<div class=\"card\">{title}</div>\n", &bindings),
            vec![Block::HtmlElement {
                tag: "div".to_string(),
                attributes: "class=\"card\"".to_string(),
                inline: true,
                children: vec![Block::paragraph("Hello")],
            }]
        );
    }

    #[test]
    fn tables_inside_elements_are_multiplied() {
        let bindings = Bindings::from_iter([("v1", "one"), ("v2", "two")]);
        let blocks = fill("<div class=\"rows\">\n\n| h |\n|---|\n| {v} |\n\n</div>\n", &bindings);
        let [Block::HtmlElement { children, .. }] = blocks.as_slice() else {
            panic!("expected one element, got {blocks:?}");
        };
        let [Block::Table { rows, .. }] = children.as_slice() else {
            panic!("expected a table, got {children:?}");
        };
        assert_eq!(
            rows,
            &vec![vec![vec![text("one")]], vec![vec![text("two")]]]
        );
    }

    #[test]
    fn placeholder_split_by_emphasis_is_literal() {
        let bindings = Bindings::from_iter([("x", "X"), ("*x*", "Y")]);
        assert_eq!(
            fill("{*x*}", &bindings),
            vec![Block::Paragraph {
                content: vec![text("{"), Span::Emphasis(vec![text("x")]), text("}")],
            }]
        );
    }

    #[test]
    fn soft_breaks_pass_through() {
        let bindings = Bindings::from_iter([("a", "A"), ("b", "B")]);
        assert_eq!(
            fill("{a}\n{b}", &bindings),
            vec![Block::Paragraph {
                content: vec![text("A"), Span::SoftBreak, text("B")],
            }]
        );
    }

    #[test]
    fn inline_html_text_between_tags_is_substituted() {
        let bindings = Bindings::from_iter([("x", "X")]);
        assert_eq!(
            fill("a <span>{x}</span>", &bindings),
            vec![Block::Paragraph {
                content: vec![
                    text("a "),
                    Span::Html("<span>".to_string()),
                    text("X"),
                    Span::Html("</span>".to_string()),
                ],
            }]
        );
    }

    #[test]
    fn other_blocks_pass_through() {
        let bindings = Bindings::from_iter([("x", "X")]);
        let markdown = "```\n{x}\n```\n\n- {x}\n\n> {x}\n\n---\n";
        let blocks = fill(markdown, &bindings);
        assert_eq!(
            blocks,
            vec![
                Block::CodeBlock {
                    language: None,
                    content: "{x}\n".to_string(),
                },
                Block::List(List {
                    start: None,
                    items: vec![ListItem {
                        content: vec![text("{x}")],
                        nested: None,
                        checked: None,
                    }],
                }),
                Block::BlockQuote(vec![Block::paragraph("{x}")]),
                Block::Rule,
            ]
        );
    }
}
