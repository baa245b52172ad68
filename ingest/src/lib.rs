pub mod extract;

pub use extract::{ingest, load_dir, pdf_info, DocumentMetadata, IngestError, IngestedDocument};
