//! Known parameter vocabulary observed in Revit family documents.
//!
//! The tables are used to spot values that would need a code or mapping
//! update; the mix of German and English reflects the corpora the tool is
//! run against.

use std::collections::BTreeSet;

use crate::model::{FamilyEntry, Parameter};

pub const KNOWN_PARAMETER_TYPES: &[&str] = &["system", "custom", "instance", "type", "shared"];

pub const KNOWN_TYPE_OF_PARAMETERS: &[&str] = &[
    "Ja/Nein",
    "Yes/No",
    "Länge",
    "Material",
    "Text",
    "Zahl",
    "Winkel",
    "Volumen",
    "Fläche",
    "Kraft",
    "Moment",
    "Währung",
    "Masse",
    "Massendichte",
    "URL",
    "Bild",
    "Multiline Text",
    "Familie-Typ",
    "Laden-Familie",
    "Ja/Nein-Parameter",
    "Integer",
    "Nummer",
    "Slope",
    "Speed",
    "Acceleration",
];

/// Collects vocabulary outside the known tables, deduplicated and sorted,
/// for the end-of-batch warning report.
pub fn scan_unknown_vocabulary(entry: &FamilyEntry) -> Vec<String> {
    let mut found = BTreeSet::new();

    for feature in &entry.features {
        for group in &feature.groups {
            for parameter in &group.parameters {
                record(&mut found, "parameter", parameter);
            }
        }
    }
    if let Some(family) = &entry.family {
        for part in &family.parts {
            for parameter in &part.parameters {
                record(&mut found, "part parameter", parameter);
            }
        }
    }

    found.into_iter().collect()
}

fn record(found: &mut BTreeSet<String>, context: &str, parameter: &Parameter) {
    if !parameter.param_type.is_empty()
        && !KNOWN_PARAMETER_TYPES.contains(&parameter.param_type.as_str())
    {
        found.insert(format!("new {} type: {}", context, parameter.param_type));
    }
    if let Some(type_of) = &parameter.type_of_parameter {
        if !KNOWN_TYPE_OF_PARAMETERS.contains(&type_of.as_str()) {
            found.insert(format!("new {} typeOfParameter: {}", context, type_of));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::model::{Feature, ParameterGroup};

    fn entry_with_parameter(param_type: &str, type_of: Option<&str>) -> FamilyEntry {
        FamilyEntry {
            name: "x".to_string(),
            id: String::new(),
            updated: Utc::now(),
            taxonomies: Vec::new(),
            categories: Vec::new(),
            links: Vec::new(),
            features: vec![Feature {
                name: "f".to_string(),
                groups: vec![ParameterGroup {
                    name: "g".to_string(),
                    parameters: vec![Parameter {
                        name: "Width".to_string(),
                        display_name: None,
                        param_type: param_type.to_string(),
                        type_of_parameter: type_of.map(str::to_string),
                        units: None,
                        value: None,
                    }],
                }],
            }],
            family: None,
        }
    }

    #[test]
    fn known_vocabulary_is_silent() {
        let entry = entry_with_parameter("custom", Some("Länge"));
        assert!(scan_unknown_vocabulary(&entry).is_empty());
    }

    #[test]
    fn unknown_values_are_reported_once() {
        let mut entry = entry_with_parameter("exotic", Some("Hyperlänge"));
        // a duplicate parameter must not duplicate the report
        let duplicate = entry.features[0].groups[0].parameters[0].clone();
        entry.features[0].groups[0].parameters.push(duplicate);
        let found = scan_unknown_vocabulary(&entry);
        assert_eq!(
            found,
            vec![
                "new parameter type: exotic".to_string(),
                "new parameter typeOfParameter: Hyperlänge".to_string(),
            ]
        );
    }
}
