//! Markdown to HTML conversion using pulldown-cmark.

use pulldown_cmark::{CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd, html};

use super::highlight::Highlighter;

fn options() -> Options {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_TABLES);
    opts.insert(Options::ENABLE_FOOTNOTES);
    opts.insert(Options::ENABLE_STRIKETHROUGH);
    opts.insert(Options::ENABLE_TASKLISTS);
    opts
}

/// Convert markdown to HTML, highlighting code blocks when a highlighter is given.
pub fn to_html(source: &str, highlighter: Option<&Highlighter>) -> String {
    let parser = Parser::new_ext(source, options());
    let mut out = String::with_capacity(source.len() * 3 / 2);

    match highlighter {
        Some(hl) => html::push_html(&mut out, highlight_code_blocks(parser, hl).into_iter()),
        None => html::push_html(&mut out, parser),
    }

    out
}

/// Replace every code block with pre-rendered highlighted HTML.
fn highlight_code_blocks<'a>(parser: Parser<'a>, hl: &Highlighter) -> Vec<Event<'a>> {
    let mut events = Vec::new();
    // (language, accumulated code) while inside a code block
    let mut block: Option<(String, String)> = None;

    for event in parser {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(info) => {
                        info.split_whitespace().next().unwrap_or_default().to_string()
                    }
                    CodeBlockKind::Indented => String::new(),
                };
                block = Some((lang, String::new()));
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some((lang, code)) = block.take() {
                    events.push(Event::Html(CowStr::from(hl.highlight(&code, &lang))));
                }
            }
            Event::Text(text) if block.is_some() => {
                if let Some((_, code)) = block.as_mut() {
                    code.push_str(&text);
                }
            }
            other => events.push(other),
        }
    }

    events
}
