//! Streaming WXR event parser.
//!
//! Pull-based reader over the raw XML byte stream. The export can be far
//! larger than memory (hundreds of thousands of `<item>` elements), so events
//! are produced incrementally from a fixed reuse buffer; nothing ever builds
//! a document tree.
//!
//! WordPress exports routinely contain unescaped ampersands and broken
//! entities inside free text. A malformed fragment must at worst corrupt one
//! record, never the run: parse errors are counted and skipped, and entity
//! unescape failures fall back to the raw text.

use anyhow::{Result, bail};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::io::BufRead;

/// One parser event, decoded to owned strings.
///
/// Tag names are lowercased with their namespace prefix retained
/// (`wp:category`, `content:encoded`). Text and CDATA both surface as
/// `Text`, verbatim: trimming is a classifier decision because whitespace
/// inside `content:encoded` is meaningful.
#[derive(Debug, Clone, PartialEq)]
pub enum WxrEvent {
    Open {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
    Close(String),
    Eof,
}

/// Streaming WXR parser wrapping a `quick_xml::Reader`.
pub struct WxrParser<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    /// Close event synthesized for a self-closing element.
    pending_close: Option<String>,
    recovered: usize,
    last_error_pos: u64,
}

impl<R: BufRead> WxrParser<R> {
    pub fn new(source: R) -> Self {
        let mut reader = Reader::from_reader(source);
        reader.config_mut().trim_text(false);
        reader.config_mut().enable_all_checks(false);
        Self {
            reader,
            buf: Vec::with_capacity(64 * 1024),
            pending_close: None,
            recovered: 0,
            last_error_pos: 0,
        }
    }

    /// Number of malformed fragments skipped so far.
    pub fn recovered_errors(&self) -> usize {
        self.recovered
    }

    /// Pull the next event. Returns `WxrEvent::Eof` once the stream ends.
    pub fn next_event(&mut self) -> Result<WxrEvent> {
        if let Some(tag) = self.pending_close.take() {
            return Ok(WxrEvent::Close(tag));
        }

        loop {
            self.buf.clear();
            match self.reader.read_event_into(&mut self.buf) {
                Ok(Event::Start(elem)) => return Ok(open_event(&elem)),
                Ok(Event::Empty(elem)) => {
                    let event = open_event(&elem);
                    if let WxrEvent::Open { tag, .. } = &event {
                        self.pending_close = Some(tag.clone());
                    }
                    return Ok(event);
                }
                Ok(Event::End(elem)) => {
                    return Ok(WxrEvent::Close(tag_name(elem.name().as_ref())));
                }
                Ok(Event::Text(text)) => {
                    return Ok(WxrEvent::Text(decode_text(text.as_ref())));
                }
                Ok(Event::CData(cdata)) => {
                    // CDATA content is literal, never entity-decoded
                    return Ok(WxrEvent::Text(
                        String::from_utf8_lossy(cdata.as_ref()).into_owned(),
                    ));
                }
                Ok(Event::Eof) => return Ok(WxrEvent::Eof),
                // Declarations, comments, PIs, doctype: nothing to classify
                Ok(_) => {}
                Err(err) => {
                    let pos = self.reader.buffer_position();
                    if pos == self.last_error_pos {
                        bail!("XML stream stuck at byte {pos}: {err}");
                    }
                    self.last_error_pos = pos;
                    self.recovered += 1;
                }
            }
        }
    }
}

fn open_event(elem: &BytesStart<'_>) -> WxrEvent {
    let attrs = elem
        .attributes()
        .flatten()
        .map(|attr| {
            (
                tag_name(attr.key.as_ref()),
                decode_text(attr.value.as_ref()),
            )
        })
        .collect();
    WxrEvent::Open {
        tag: tag_name(elem.name().as_ref()),
        attrs,
    }
}

fn tag_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_ascii_lowercase()
}

/// Decode raw text bytes, resolving entities where possible.
///
/// An invalid entity keeps the text as-is instead of poisoning the record.
fn decode_text(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    match quick_xml::escape::unescape(&text) {
        Ok(unescaped) => unescaped.into_owned(),
        Err(_) => text.into_owned(),
    }
}
