//! Three-tier search for the XML document embedded in a binary container.
//!
//! Each tier is a pure `bytes -> Option<Located>` strategy, tried in order
//! with short-circuit on first success. A rejected candidate never raises;
//! only exhaustion of every tier reports `Error::NotFound`.

use std::sync::OnceLock;

use regex::bytes::Regex;
use tracing::debug;

use crate::dom::parse_document;
use crate::encoding::{decode, Encoding};
use crate::error::Error;
use crate::repair::repair_xml;
use crate::span::Span;

const SYNTHETIC_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";
const ENTRY_CLOSE: &[u8] = b"</entry>";

#[derive(Debug, Clone)]
pub struct Located {
    /// Byte range of the candidate inside the original blob.
    pub span: Span,
    /// The validated document text, declaration included.
    pub xml: String,
    pub encoding: Encoding,
    pub repaired: bool,
    pub synthesized_declaration: bool,
}

pub fn locate_embedded_xml(bytes: &[u8]) -> Result<Located, Error> {
    let strategies: &[(&str, fn(&[u8]) -> Option<Located>)] = &[
        ("declaration", declared_document),
        ("entry-block", entry_block),
        ("generic-tag", any_tag_block),
    ];
    for &(tier, strategy) in strategies {
        if let Some(found) = strategy(bytes) {
            debug!(
                tier,
                start = found.span.start,
                len = found.span.len(),
                encoding = found.encoding.name(),
                repaired = found.repaired,
                "embedded document located"
            );
            return Ok(found);
        }
    }
    Err(Error::NotFound)
}

/// Tier 1: an XML declaration followed by the first `</entry>` after it.
fn declared_document(bytes: &[u8]) -> Option<Located> {
    let decl = declaration_re().find(bytes)?;
    let close = find_subslice(&bytes[decl.start()..], ENTRY_CLOSE)?;
    let span = Span { start: decl.start(), end: decl.start() + close + ENTRY_CLOSE.len() };
    validate_candidate(bytes, span, false)
}

/// Tier 2: a bare `<entry ...>` block; a declaration is synthesized when
/// the decoded text lacks one.
fn entry_block(bytes: &[u8]) -> Option<Located> {
    let open = entry_open_re().find(bytes)?;
    let close = find_subslice(&bytes[open.start()..], ENTRY_CLOSE)?;
    let span = Span { start: open.start(), end: open.start() + close + ENTRY_CLOSE.len() };
    validate_candidate(bytes, span, true)
}

/// Tier 3: progressively looser opening-tag patterns; every match of every
/// pattern is tried against its own matching closing tag.
fn any_tag_block(bytes: &[u8]) -> Option<Located> {
    for pattern in [entry_xmlns_re(), tag_xmlns_re(), entry_open_re()] {
        for open in pattern.find_iter(bytes) {
            let rest = &bytes[open.start()..];
            let Some(tag) = tag_name_re().captures(rest) else { continue };
            let mut closing = Vec::with_capacity(tag[1].len() + 3);
            closing.extend_from_slice(b"</");
            closing.extend_from_slice(&tag[1]);
            closing.push(b'>');
            let Some(close) = find_subslice(rest, &closing) else { continue };
            let span = Span { start: open.start(), end: open.start() + close + closing.len() };
            if let Some(found) = validate_candidate(bytes, span, true) {
                return Some(found);
            }
        }
    }
    None
}

/// Decode the candidate range under each encoding in order, accepting the
/// first text that parses as well-formed markup. One repair pass is allowed
/// per candidate.
fn validate_candidate(bytes: &[u8], span: Span, synthesize_declaration: bool) -> Option<Located> {
    let range = span.slice(bytes);
    let mut repair_spent = false;
    for encoding in Encoding::CANDIDATES {
        let Some(text) = decode(range, encoding) else { continue };
        let (doc, synthesized) = if synthesize_declaration && !text.starts_with("<?xml") {
            (format!("{SYNTHETIC_DECLARATION}{text}"), true)
        } else {
            (text, false)
        };
        if parse_document(&doc).is_ok() {
            return Some(Located {
                span,
                xml: doc,
                encoding,
                repaired: false,
                synthesized_declaration: synthesized,
            });
        }
        if !repair_spent {
            repair_spent = true;
            let fixed = repair_xml(&doc);
            if parse_document(&fixed).is_ok() {
                return Some(Located {
                    span,
                    xml: fixed,
                    encoding,
                    repaired: true,
                    synthesized_declaration: synthesized,
                });
            }
        }
    }
    None
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|window| window == needle)
}

fn declaration_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?-u)<\?xml\s+version="1\.0"[^>]*\?>"#).expect("declaration pattern"))
}

fn entry_open_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?-u)<entry[^>]*>").expect("entry pattern"))
}

fn entry_xmlns_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?-u)<entry[^>]*xmlns[^>]*>").expect("entry-xmlns pattern"))
}

fn tag_xmlns_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?-u)<\w+[^>]*xmlns[^>]*>").expect("tag-xmlns pattern"))
}

fn tag_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?-u)^<(\w+)").expect("tag-name pattern"))
}
