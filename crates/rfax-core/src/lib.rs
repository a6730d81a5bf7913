pub mod config;
pub mod extract;
pub mod known;
pub mod map;
pub mod model;
pub mod repository;
pub mod service;
pub mod validate;

pub use crate::extract::NAMESPACES;
pub use crate::service::{extract_entry, extract_entry_at, Extraction, ServiceError};
