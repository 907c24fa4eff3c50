//! PDF input and output.
//!
//! [`extract`] pulls positioned text fragments out of a source document;
//! [`write`] renders planned pages into a fresh document.

pub mod extract;
pub mod write;

pub use extract::{PdfReader, RawPage};
pub use write::{write_document, write_layout, write_pages, PdfWriter};
