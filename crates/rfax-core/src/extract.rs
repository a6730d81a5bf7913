//! Walks a validated element tree into a generic JSON document.
//!
//! This stage strips namespace prefixes and coerces the two scalar shapes
//! (timestamps, the variation count); the domain mapper turns the generic
//! document into typed entities. Elements absent from the tree yield
//! defaults here, never errors.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use rfax_xml::dom::{Element, Namespaces};
use serde_json::{json, Value};

/// The two bindings every partatom document uses.
pub const NAMESPACES: Namespaces = Namespaces {
    syndication: "http://www.w3.org/2005/Atom",
    vendor: "urn:schemas-autodesk-com:partatom",
};

pub fn document_to_value(root: &Element, ns: &Namespaces, now: DateTime<Utc>) -> Value {
    json!({
        "name": child_text(root, &ns.syndication_name("title")),
        "id": child_text(root, &ns.syndication_name("id")),
        "updated": updated_value(root.find(&ns.syndication_name("updated")), now),
        "taxonomies": taxonomies(root, ns),
        "categories": categories(root, ns),
        "links": links(root, ns, now),
        "features": features(root, ns),
        "family": family(root, ns),
    })
}

/// ISO-8601 with a trailing `Z` treated as `+00:00`; naive timestamps are
/// read as UTC. Anything else falls back to the injected clock value.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn updated_value(elem: Option<&Element>, now: DateTime<Utc>) -> String {
    elem.and_then(Element::text)
        .and_then(parse_timestamp)
        .unwrap_or(now)
        .to_rfc3339()
}

fn child_text(elem: &Element, name: &str) -> String {
    elem.find(name).and_then(Element::text).unwrap_or("").to_string()
}

fn taxonomies(root: &Element, ns: &Namespaces) -> Value {
    let mut out = Vec::new();
    for taxonomy in root.find_all(&ns.vendor_name("taxonomy")) {
        let term = taxonomy.find(&ns.syndication_name("term"));
        let label = taxonomy.find(&ns.syndication_name("label"));
        // only emitted when both children are present
        if let (Some(term), Some(label)) = (term, label) {
            out.push(json!({
                "term": term.text().unwrap_or(""),
                "label": label.text().unwrap_or(""),
            }));
        }
    }
    Value::Array(out)
}

fn categories(root: &Element, ns: &Namespaces) -> Value {
    let term_name = ns.syndication_name("term");
    root.find_all(&ns.syndication_name("category"))
        .iter()
        .map(|category| {
            let term = category.find(&term_name).and_then(Element::text).unwrap_or("");
            json!({ "name": term })
        })
        .collect::<Vec<_>>()
        .into()
}

fn links(root: &Element, ns: &Namespaces, now: DateTime<Utc>) -> Value {
    root.find_all(&ns.syndication_name("link"))
        .iter()
        .map(|link| {
            json!({
                "rel": link.attr("rel").unwrap_or(""),
                "type": link.attr("type").unwrap_or(""),
                "href": link.attr("href").unwrap_or(""),
                "design_file": design_file(link, ns, now),
            })
        })
        .collect::<Vec<_>>()
        .into()
}

fn design_file(link: &Element, ns: &Namespaces, now: DateTime<Utc>) -> Value {
    let Some(df) = link.find(&ns.vendor_name("design-file")) else {
        return Value::Null;
    };
    json!({
        "name": child_text(df, &ns.vendor_name("title")),
        "product": child_text(df, &ns.vendor_name("product")),
        "product_version": child_text(df, &ns.vendor_name("product-version")),
        "updated": updated_value(df.find(&ns.vendor_name("updated")), now),
    })
}

fn features(root: &Element, ns: &Namespaces) -> Value {
    let Some(wrapper) = root.find(&ns.vendor_name("features")) else {
        return json!([]);
    };
    wrapper
        .find_all(&ns.vendor_name("feature"))
        .iter()
        .map(|feature| {
            json!({
                "name": child_text(feature, &ns.vendor_name("title")),
                "groups": groups(feature, ns),
            })
        })
        .collect::<Vec<_>>()
        .into()
}

fn groups(feature: &Element, ns: &Namespaces) -> Value {
    feature
        .find_all(&ns.vendor_name("group"))
        .iter()
        .map(|group| {
            json!({
                "name": child_text(group, &ns.vendor_name("title")),
                "parameters": group_parameters(group, ns),
            })
        })
        .collect::<Vec<_>>()
        .into()
}

/// Group children skip every vendor-namespace element and any element whose
/// stripped name is "title" in any casing. Part children (below) skip only
/// the exact syndication-namespace title. The asymmetry is preserved as
/// observed in the reference behaviour; do not harmonize without a product
/// decision.
fn group_parameters(group: &Element, ns: &Namespaces) -> Value {
    let vendor_prefix = ns.vendor_bracket();
    group
        .children
        .iter()
        .filter(|child| {
            !child.name.starts_with(&vendor_prefix)
                && child.local_name().to_lowercase() != "title"
        })
        .map(parameter_value)
        .collect::<Vec<_>>()
        .into()
}

fn part_parameters(part: &Element, ns: &Namespaces) -> Value {
    let title_name = ns.syndication_name("title");
    part.children
        .iter()
        .filter(|child| child.name != title_name)
        .map(parameter_value)
        .collect::<Vec<_>>()
        .into()
}

fn parameter_value(elem: &Element) -> Value {
    json!({
        "name": elem.local_name(),
        "display_name": elem.attr("displayName"),
        "type": elem.attr("type").unwrap_or("custom"),
        "type_of_parameter": elem.attr("typeOfParameter"),
        "units": elem.attr("units"),
        "value": elem.text(),
    })
}

fn family(root: &Element, ns: &Namespaces) -> Value {
    let Some(fam) = root.find(&ns.vendor_name("family")) else {
        return Value::Null;
    };
    let variation_count = fam
        .find(&ns.vendor_name("variationCount"))
        .and_then(Element::text)
        .map(|text| text.trim().parse::<i64>().unwrap_or(0))
        .unwrap_or(0);
    json!({
        "type": fam.attr("type").unwrap_or("user"),
        "variation_count": variation_count,
        "parts": parts(fam, ns),
    })
}

fn parts(fam: &Element, ns: &Namespaces) -> Value {
    fam.find_all(&ns.vendor_name("part"))
        .iter()
        .map(|part| {
            json!({
                "name": child_text(part, &ns.syndication_name("title")),
                "type": part.attr("type").unwrap_or("user"),
                "parameters": part_parameters(part, ns),
            })
        })
        .collect::<Vec<_>>()
        .into()
}
