//! One-shot sanitization for byte ranges that fail to parse.
//!
//! This is a heuristic, not a general XML repair: it recovers stray
//! unescaped markup characters and control bytes, but cannot recover
//! mismatched nesting or missing closing tags. The pass is idempotent and
//! the locator applies it at most once per candidate range.

use std::sync::OnceLock;

use regex::{Captures, Regex};

pub fn repair_xml(xml: &str) -> String {
    let cleaned: String = xml.chars().filter(|c| !is_stripped_control(*c)).collect();
    let cleaned = fix_declaration(cleaned);
    // The declaration survives the rescue pass only if it never enters it.
    let (declaration, body) = split_declaration(&cleaned);
    let escaped = escape_markup(body);
    let rescued = rescue_re().replace_all(&escaped, "<$1>");
    format!("{declaration}{rescued}")
}

fn is_stripped_control(c: char) -> bool {
    matches!(c, '\u{00}'..='\u{08}' | '\u{0B}' | '\u{0C}' | '\u{0E}'..='\u{1F}' | '\u{7F}')
}

fn fix_declaration(xml: String) -> String {
    if xml.contains("<?xml") && !xml.contains("encoding=") {
        xml.replace("<?xml version=\"1.0\"?>", "<?xml version=\"1.0\" encoding=\"UTF-8\"?>")
    } else {
        xml
    }
}

fn split_declaration(xml: &str) -> (&str, &str) {
    match declaration_prefix_re().find(xml) {
        Some(m) => xml.split_at(m.end()),
        None => ("", xml),
    }
}

/// Escape `&`, `<` and `>` globally, leaving existing entity references
/// alone so the pass stays idempotent.
fn escape_markup(text: &str) -> String {
    let escaped = entity_re().replace_all(text, |caps: &Captures<'_>| {
        if caps.get(1).is_some() {
            caps[0].to_string()
        } else {
            "&amp;".to_string()
        }
    });
    escaped.replace('<', "&lt;").replace('>', "&gt;")
}

fn entity_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"&(amp;|lt;|gt;|apos;|quot;|#[0-9]+;|#x[0-9a-fA-F]+;)?").expect("entity pattern")
    })
}

fn declaration_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*<\?xml[^>]*\?>").expect("declaration pattern"))
}

fn rescue_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"&lt;(/?[\w:]+[^&]*?)&gt;").expect("rescue pattern"))
}
