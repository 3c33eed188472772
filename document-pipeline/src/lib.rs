pub mod assembler;
pub mod cache;
pub mod extractor;
pub mod fetcher;
pub mod manifest;
pub mod reference;

pub use assembler::{assemble, AssemblyError};
pub use cache::DocumentCache;
pub use extractor::{ExtractError, PdfExtractor, TextExtractor};
pub use fetcher::{DocumentFetcher, DocumentSource, FetchError};
pub use manifest::load_document_list;
pub use reference::{DocumentList, DocumentReference};
