//! Owned element tree with resolved namespace names.
//!
//! Element names carry their namespace in the bracketed `{uri}local` form;
//! an unbound name stays bare. Building the tree doubles as the
//! well-formedness check: mismatched tags, undeclared prefixes, broken
//! entity references and content outside the single root all fail.

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed markup: {0}")]
    Malformed(String),
    #[error("document has no root element")]
    NoRoot,
    #[error("content after document root")]
    TrailingContent,
    #[error("text outside document root")]
    TextOutsideRoot,
}

/// Two fixed namespace bindings, passed explicitly into every lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Namespaces {
    pub syndication: &'static str,
    pub vendor: &'static str,
}

impl Namespaces {
    pub fn syndication_name(&self, local: &str) -> String {
        format!("{{{}}}{}", self.syndication, local)
    }

    pub fn vendor_name(&self, local: &str) -> String {
        format!("{{{}}}{}", self.vendor, local)
    }

    pub fn syndication_bracket(&self) -> String {
        format!("{{{}}}", self.syndication)
    }

    pub fn vendor_bracket(&self) -> String {
        format!("{{{}}}", self.vendor)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub text: Option<String>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn find(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn find_all(&self, name: &str) -> Vec<&Element> {
        self.children.iter().filter(|c| c.name == name).collect()
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn local_name(&self) -> &str {
        strip_namespace(&self.name)
    }
}

/// `{namespace-uri}localname` maps to `localname`; a tag without the
/// bracketed prefix is returned unchanged.
pub fn strip_namespace(tag: &str) -> &str {
    if let Some(rest) = tag.strip_prefix('{') {
        if let Some(close) = rest.find('}') {
            return &rest[close + 1..];
        }
    }
    tag
}

pub fn parse_document(xml: &str) -> Result<Element, ParseError> {
    let mut reader = NsReader::from_str(xml);
    reader.config_mut().check_end_names = true;

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_resolved_event() {
            Err(e) => return Err(ParseError::Malformed(e.to_string())),
            Ok((resolve, event)) => match event {
                Event::Start(start) => {
                    if root.is_some() && stack.is_empty() {
                        return Err(ParseError::TrailingContent);
                    }
                    let elem = open_element(&resolve, &start)?;
                    stack.push(elem);
                }
                Event::Empty(start) => {
                    if root.is_some() && stack.is_empty() {
                        return Err(ParseError::TrailingContent);
                    }
                    let elem = open_element(&resolve, &start)?;
                    attach(&mut stack, &mut root, elem)?;
                }
                Event::End(_) => {
                    let elem = stack
                        .pop()
                        .ok_or_else(|| ParseError::Malformed("unmatched closing tag".into()))?;
                    attach(&mut stack, &mut root, elem)?;
                }
                Event::Text(text) => {
                    let raw = std::str::from_utf8(&text)
                        .map_err(|e| ParseError::Malformed(e.to_string()))?;
                    let text = quick_xml::escape::unescape(raw)
                        .map_err(|e| ParseError::Malformed(e.to_string()))?;
                    append_text(&mut stack, &text)?;
                }
                Event::CData(cdata) => {
                    let text = std::str::from_utf8(&cdata)
                        .map_err(|e| ParseError::Malformed(e.to_string()))?
                        .to_owned();
                    append_text(&mut stack, &text)?;
                }
                Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
                Event::Eof => break,
            },
        }
    }

    if !stack.is_empty() {
        return Err(ParseError::Malformed("unclosed element".into()));
    }
    root.ok_or(ParseError::NoRoot)
}

fn open_element(resolve: &ResolveResult<'_>, start: &BytesStart<'_>) -> Result<Element, ParseError> {
    let local = std::str::from_utf8(start.local_name().as_ref())
        .map_err(|e| ParseError::Malformed(e.to_string()))?
        .to_owned();
    let name = match resolve {
        ResolveResult::Bound(ns) => {
            let uri = std::str::from_utf8(ns.0)
                .map_err(|e| ParseError::Malformed(e.to_string()))?;
            format!("{{{uri}}}{local}")
        }
        ResolveResult::Unbound => local,
        ResolveResult::Unknown(prefix) => {
            return Err(ParseError::Malformed(format!(
                "unbound namespace prefix {}",
                String::from_utf8_lossy(prefix)
            )));
        }
    };

    let mut attrs = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| ParseError::Malformed(e.to_string()))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| ParseError::Malformed(e.to_string()))?
            .to_owned();
        // namespace declarations are bindings, not data
        if key == "xmlns" || key.starts_with("xmlns:") {
            continue;
        }
        let value = attr
            .unescape_value()
            .map_err(|e| ParseError::Malformed(e.to_string()))?
            .into_owned();
        attrs.push((key, value));
    }

    Ok(Element { name, attrs, text: None, children: Vec::new() })
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    elem: Element,
) -> Result<(), ParseError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(elem);
            Ok(())
        }
        None => {
            if root.is_some() {
                return Err(ParseError::TrailingContent);
            }
            *root = Some(elem);
            Ok(())
        }
    }
}

fn append_text(stack: &mut [Element], text: &str) -> Result<(), ParseError> {
    match stack.last_mut() {
        Some(parent) => {
            // only character data before the first child is element text;
            // tails between siblings carry no meaning for this format
            if parent.children.is_empty() {
                parent.text.get_or_insert_with(String::new).push_str(text);
            }
            Ok(())
        }
        None => {
            if text.trim().is_empty() {
                Ok(())
            } else {
                Err(ParseError::TextOutsideRoot)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: Namespaces = Namespaces {
        syndication: "http://www.w3.org/2005/Atom",
        vendor: "urn:schemas-autodesk-com:partatom",
    };

    #[test]
    fn resolves_default_and_prefixed_namespaces() {
        let root = parse_document(
            "<entry xmlns=\"http://www.w3.org/2005/Atom\" \
             xmlns:A=\"urn:schemas-autodesk-com:partatom\">\
             <title>Chair</title><A:family type=\"user\"/></entry>",
        )
        .unwrap();
        assert_eq!(root.name, NS.syndication_name("entry"));
        let title = root.find(&NS.syndication_name("title")).unwrap();
        assert_eq!(title.text(), Some("Chair"));
        let family = root.find(&NS.vendor_name("family")).unwrap();
        assert_eq!(family.attr("type"), Some("user"));
    }

    #[test]
    fn unprefixed_names_stay_bare_without_default_namespace() {
        let root = parse_document("<entry><title>x</title></entry>").unwrap();
        assert_eq!(root.name, "entry");
        assert_eq!(root.find("title").unwrap().text(), Some("x"));
    }

    #[test]
    fn xmlns_reset_unbinds_the_default_namespace() {
        let root = parse_document(
            "<entry xmlns=\"http://www.w3.org/2005/Atom\"><Title xmlns=\"\">x</Title></entry>",
        )
        .unwrap();
        assert_eq!(root.children[0].name, "Title");
    }

    #[test]
    fn text_is_only_the_leading_character_data() {
        let root = parse_document("<a>lead<b/>tail</a>").unwrap();
        assert_eq!(root.text(), Some("lead"));
        assert_eq!(root.children.len(), 1);
    }

    #[test]
    fn empty_element_has_no_text() {
        let root = parse_document("<a><b></b><c/></a>").unwrap();
        assert_eq!(root.children[0].text(), None);
        assert_eq!(root.children[1].text(), None);
    }

    #[test]
    fn entities_are_expanded() {
        let root = parse_document("<a q=\"x&amp;y\">1 &lt; 2</a>").unwrap();
        assert_eq!(root.text(), Some("1 < 2"));
        assert_eq!(root.attr("q"), Some("x&y"));
    }

    #[test]
    fn namespace_declarations_are_not_attributes() {
        let root = parse_document("<a xmlns=\"urn:x\" xmlns:b=\"urn:y\" k=\"v\"/>").unwrap();
        assert_eq!(root.attrs, vec![("k".to_string(), "v".to_string())]);
    }

    #[test]
    fn rejects_mismatched_tags() {
        assert!(parse_document("<a><b></a></b>").is_err());
    }

    #[test]
    fn rejects_unbound_prefix() {
        assert!(parse_document("<A:family>x</A:family>").is_err());
    }

    #[test]
    fn rejects_content_after_root() {
        assert!(matches!(parse_document("<a/>junk"), Err(ParseError::TextOutsideRoot)));
        assert!(matches!(parse_document("<a/><b/>"), Err(ParseError::TrailingContent)));
    }

    #[test]
    fn rejects_empty_input() {
        assert!(matches!(parse_document(""), Err(ParseError::NoRoot)));
    }

    #[test]
    fn strips_bracketed_namespace_prefix() {
        assert_eq!(strip_namespace("{http://www.w3.org/2005/Atom}Material_Family"), "Material_Family");
        assert_eq!(strip_namespace("Material_Family"), "Material_Family");
        assert_eq!(strip_namespace("{unclosed"), "{unclosed");
    }
}
