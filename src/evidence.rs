//! Durable evidence for issued overspeed events.

mod document;
mod key;
mod store;
mod writer;

pub use document::{
    DOCUMENT_TITLE, DocumentRenderer, EvidenceDocument, SvgPageRenderer, fit_within, image_area,
};
pub use key::{EvidenceKey, UNKNOWN_PLATE, sanitize_plate};
pub use store::{EvidenceRecord, EvidenceStore, NewEvidence, SqliteEvidenceStore};
pub use writer::EvidenceWriter;
