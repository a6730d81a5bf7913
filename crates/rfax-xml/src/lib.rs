pub mod dom;
pub mod encoding;
pub mod error;
pub mod locate;
pub mod repair;
pub mod span;

pub use crate::error::Error;
pub use crate::locate::{locate_embedded_xml, Located};
