//! Single-input extraction pipeline and file-level entry points.
//!
//! Extraction is all-or-nothing: no partial entity is ever returned. Each
//! call owns its buffers exclusively and performs no I/O beyond the initial
//! read, so callers may extract multiple inputs in parallel freely.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rfax_xml::dom::{parse_document, Element};
use rfax_xml::encoding::{decode_any, Encoding};
use rfax_xml::locate::locate_embedded_xml;
use rfax_xml::repair::repair_xml;
use rfax_xml::span::Span;
use thiserror::Error;

use crate::extract::{document_to_value, NAMESPACES};
use crate::map::entry_from_value;
use crate::model::FamilyEntry;
use crate::repository;
use crate::validate::{scan_namespace_leaks, NamespaceLeak};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("input could not be read: {path}")]
    MissingInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Xml(#[from] rfax_xml::Error),
    #[error("could not write JSON document: {0}")]
    Write(#[source] std::io::Error),
    #[error("invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result of one successful extraction: the entity graph plus the
/// locator and validator diagnostics.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub entry: FamilyEntry,
    pub span: Span,
    pub encoding: Encoding,
    pub repaired: bool,
    pub synthesized_declaration: bool,
    pub namespace_leaks: Vec<NamespaceLeak>,
}

pub fn extract_entry(bytes: &[u8]) -> Result<Extraction, ServiceError> {
    extract_entry_at(bytes, Utc::now())
}

/// Fixed-clock variant: `now` is the fallback for unparsable timestamps.
pub fn extract_entry_at(bytes: &[u8], now: DateTime<Utc>) -> Result<Extraction, ServiceError> {
    let located = locate_embedded_xml(bytes)?;
    let root = parse_document(&located.xml)
        .map_err(|e| rfax_xml::Error::Format(e.to_string()))?;
    let entry = build_entry(&root, now);
    let namespace_leaks = scan_namespace_leaks(&entry, &NAMESPACES);
    Ok(Extraction {
        entry,
        span: located.span,
        encoding: located.encoding,
        repaired: located.repaired,
        synthesized_declaration: located.synthesized_declaration,
        namespace_leaks,
    })
}

/// Direct-XML entry point: parse, with one repair pass on failure.
pub fn extract_entry_from_str(xml: &str) -> Result<FamilyEntry, ServiceError> {
    extract_entry_from_str_at(xml, Utc::now())
}

pub fn extract_entry_from_str_at(
    xml: &str,
    now: DateTime<Utc>,
) -> Result<FamilyEntry, ServiceError> {
    let root = match parse_document(xml) {
        Ok(root) => root,
        Err(_) => {
            let fixed = repair_xml(xml);
            parse_document(&fixed).map_err(|e| rfax_xml::Error::Format(e.to_string()))?
        }
    };
    let entry = build_entry(&root, now);
    scan_namespace_leaks(&entry, &NAMESPACES);
    Ok(entry)
}

pub fn extract_entry_from_bytes(xml: &[u8]) -> Result<FamilyEntry, ServiceError> {
    let (text, _) = decode_any(xml).ok_or(rfax_xml::Error::Decode)?;
    extract_entry_from_str(&text)
}

pub fn read_family_file(path: &Path) -> Result<Extraction, ServiceError> {
    let bytes = fs::read(path)
        .map_err(|source| ServiceError::MissingInput { path: path.to_path_buf(), source })?;
    extract_entry(&bytes)
}

pub fn extract_and_save(rfa_path: &Path, json_path: &Path) -> Result<Extraction, ServiceError> {
    let extraction = read_family_file(rfa_path)?;
    repository::save_entry(&extraction.entry, json_path)?;
    Ok(extraction)
}

fn build_entry(root: &Element, now: DateTime<Utc>) -> FamilyEntry {
    let value = document_to_value(root, &NAMESPACES, now);
    entry_from_value(&value, now)
}
