//! Post-extraction check for namespace leakage.
//!
//! A parameter name still carrying a bracketed namespace URI signals an
//! extraction defect. Hits are reported as warnings and returned to the
//! caller; they never alter the entity or abort the extraction.

use rfax_xml::dom::Namespaces;
use tracing::warn;

use crate::model::FamilyEntry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceLeak {
    /// Where the parameter lives: a feature group or a family part.
    pub context: &'static str,
    pub parameter: String,
    pub pattern: String,
}

pub fn scan_namespace_leaks(entry: &FamilyEntry, ns: &Namespaces) -> Vec<NamespaceLeak> {
    let patterns = [ns.syndication_bracket(), ns.vendor_bracket()];
    let mut leaks = Vec::new();

    for feature in &entry.features {
        for group in &feature.groups {
            for parameter in &group.parameters {
                record(&mut leaks, "feature group", &parameter.name, &patterns);
            }
        }
    }
    if let Some(family) = &entry.family {
        for part in &family.parts {
            for parameter in &part.parameters {
                record(&mut leaks, "family part", &parameter.name, &patterns);
            }
        }
    }
    leaks
}

fn record(leaks: &mut Vec<NamespaceLeak>, context: &'static str, name: &str, patterns: &[String]) {
    for pattern in patterns {
        if name.contains(pattern.as_str()) {
            warn!(parameter = name, pattern = pattern.as_str(), "namespace prefix left in {context} parameter");
            leaks.push(NamespaceLeak {
                context,
                parameter: name.to_string(),
                pattern: pattern.clone(),
            });
        }
    }
}
