//! Document DXF : modèle en mémoire, gabarit et écriture

pub mod blocks;
pub mod document;
pub mod template;
pub mod writer;

pub use blocks::BuiltinBlock;
pub use document::{DrawingDocument, Entity, Fallback, Inserted};
pub use template::Template;
pub use writer::write_document;
