//! Org-mode to HTML conversion using orgize.

use std::io::{self, Write};

use orgize::export::{DefaultHtmlHandler, HtmlHandler};
use orgize::{Element, Org};

use super::highlight::Highlighter;

/// Delegates to the default handler, except for source blocks when
/// highlighting is enabled.
#[derive(Default)]
struct OrgHtmlHandler<'h> {
    inner: DefaultHtmlHandler,
    highlighter: Option<&'h Highlighter>,
}

impl HtmlHandler<io::Error> for OrgHtmlHandler<'_> {
    fn start<W: Write>(&mut self, mut w: W, element: &Element) -> io::Result<()> {
        match (element, self.highlighter) {
            (Element::SourceBlock(block), Some(hl)) => {
                w.write_all(hl.highlight(&block.contents, &block.language).as_bytes())
            }
            _ => self.inner.start(w, element),
        }
    }

    fn end<W: Write>(&mut self, w: W, element: &Element) -> io::Result<()> {
        match (element, self.highlighter) {
            (Element::SourceBlock(_), Some(_)) => Ok(()),
            _ => self.inner.end(w, element),
        }
    }
}

/// Convert org-mode text to HTML.
pub fn to_html(source: &str, highlighter: Option<&Highlighter>) -> io::Result<String> {
    let org = Org::parse(source);
    let mut handler = OrgHtmlHandler {
        highlighter,
        ..OrgHtmlHandler::default()
    };

    let mut out = Vec::with_capacity(source.len() * 3 / 2);
    org.write_html_custom(&mut out, &mut handler)?;

    String::from_utf8(out).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
