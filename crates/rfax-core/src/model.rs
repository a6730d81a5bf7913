//! Typed family metadata entities.
//!
//! Every entity is an immutable value record produced once per extraction
//! by the domain mapper; the graph is a simple tree owned by the caller and
//! carries no back-references. JSON field names mirror the on-disk store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

fn default_parameter_type() -> String {
    "custom".to_string()
}

fn default_origin_type() -> String {
    "user".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(rename = "type", default = "default_parameter_type")]
    pub param_type: String,
    #[serde(default)]
    pub type_of_parameter: Option<String>,
    #[serde(default)]
    pub units: Option<String>,
    /// Raw element text, no numeric coercion.
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterGroup {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub name: String,
    #[serde(default)]
    pub groups: Vec<ParameterGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyPart {
    pub name: String,
    #[serde(rename = "type", default = "default_origin_type")]
    pub part_type: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignFile {
    pub name: String,
    pub product: String,
    pub product_version: String,
    pub updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub rel: String,
    #[serde(rename = "type")]
    pub link_type: String,
    pub href: String,
    #[serde(default)]
    pub design_file: Option<DesignFile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Taxonomy {
    pub term: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Family {
    #[serde(rename = "type", default = "default_origin_type")]
    pub family_type: String,
    #[serde(default)]
    pub variation_count: i64,
    #[serde(default)]
    pub parts: Vec<FamilyPart>,
}

/// Root entity of one extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyEntry {
    pub name: String,
    pub id: String,
    pub updated: DateTime<Utc>,
    #[serde(default)]
    pub taxonomies: Vec<Taxonomy>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub features: Vec<Feature>,
    #[serde(default)]
    pub family: Option<Family>,
}
