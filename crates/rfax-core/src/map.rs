//! Domain mapper: generic JSON document to the typed entity graph.
//!
//! Every deterministic default is filled here, once, at the mapping
//! boundary. Absent or malformed optional fields never error.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::extract::parse_timestamp;
use crate::model::{
    Category, DesignFile, Family, FamilyEntry, FamilyPart, Feature, Link, Parameter,
    ParameterGroup, Taxonomy,
};

pub fn entry_from_value(data: &Value, now: DateTime<Utc>) -> FamilyEntry {
    FamilyEntry {
        name: str_field(data, "name"),
        id: str_field(data, "id"),
        updated: timestamp_field(data, "updated", now),
        taxonomies: seq(data, "taxonomies", taxonomy_from_value),
        categories: seq(data, "categories", category_from_value),
        links: seq(data, "links", |link| link_from_value(link, now)),
        features: seq(data, "features", feature_from_value),
        family: data
            .get("family")
            .filter(|family| !family.is_null())
            .map(family_from_value),
    }
}

fn taxonomy_from_value(data: &Value) -> Taxonomy {
    Taxonomy { term: str_field(data, "term"), label: str_field(data, "label") }
}

fn category_from_value(data: &Value) -> Category {
    Category { name: str_field(data, "name") }
}

fn link_from_value(data: &Value, now: DateTime<Utc>) -> Link {
    Link {
        rel: str_field(data, "rel"),
        link_type: str_field(data, "type"),
        href: str_field(data, "href"),
        design_file: data
            .get("design_file")
            .filter(|df| !df.is_null())
            .map(|df| design_file_from_value(df, now)),
    }
}

fn design_file_from_value(data: &Value, now: DateTime<Utc>) -> DesignFile {
    DesignFile {
        name: str_field(data, "name"),
        product: str_field(data, "product"),
        product_version: str_field(data, "product_version"),
        updated: timestamp_field(data, "updated", now),
    }
}

fn feature_from_value(data: &Value) -> Feature {
    Feature { name: str_field(data, "name"), groups: seq(data, "groups", group_from_value) }
}

fn group_from_value(data: &Value) -> ParameterGroup {
    ParameterGroup {
        name: str_field(data, "name"),
        parameters: seq(data, "parameters", parameter_from_value),
    }
}

fn parameter_from_value(data: &Value) -> Parameter {
    Parameter {
        name: str_field(data, "name"),
        display_name: opt_str_field(data, "display_name"),
        param_type: data
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("custom")
            .to_string(),
        type_of_parameter: opt_str_field(data, "type_of_parameter"),
        units: opt_str_field(data, "units"),
        value: opt_str_field(data, "value"),
    }
}

fn family_from_value(data: &Value) -> Family {
    Family {
        family_type: data.get("type").and_then(Value::as_str).unwrap_or("user").to_string(),
        variation_count: data.get("variation_count").and_then(Value::as_i64).unwrap_or(0),
        parts: seq(data, "parts", part_from_value),
    }
}

fn part_from_value(data: &Value) -> FamilyPart {
    FamilyPart {
        name: str_field(data, "name"),
        part_type: data.get("type").and_then(Value::as_str).unwrap_or("user").to_string(),
        parameters: seq(data, "parameters", parameter_from_value),
    }
}

fn seq<T>(data: &Value, key: &str, build: impl Fn(&Value) -> T) -> Vec<T> {
    data.get(key)
        .and_then(Value::as_array)
        .map(|items| items.iter().map(build).collect())
        .unwrap_or_default()
}

fn str_field(data: &Value, key: &str) -> String {
    data.get(key).and_then(Value::as_str).unwrap_or("").to_string()
}

fn opt_str_field(data: &Value, key: &str) -> Option<String> {
    data.get(key).and_then(Value::as_str).map(str::to_string)
}

fn timestamp_field(data: &Value, key: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    data.get(key).and_then(Value::as_str).and_then(parse_timestamp).unwrap_or(now)
}
