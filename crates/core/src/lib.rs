pub mod applications;
pub mod chunking;
pub mod corpus;
pub mod document;
pub mod embeddings;
pub mod error;
pub mod index;
pub mod models;
pub mod search;
pub mod session;

pub use applications::ApplicationStore;
pub use chunking::{split_documents, ChunkingConfig};
pub use corpus::{fingerprint, load_postings, JobCatalog};
pub use document::build_documents;
pub use embeddings::{Embedder, HashedNgramEmbedder, DEFAULT_EMBEDDING_DIMENSIONS};
pub use error::{CorpusError, IndexError, StoreError};
pub use index::{EmbeddingIndex, IndexConfig, IndexState};
pub use models::{
    ApplicationDraft, ApplicationRecord, CandidateProfile, ChunkMetadata, JobChunk, JobDocument,
    JobPosting, JobSearchResult, ResumeFile, ScreeningAnswer, ScreeningQuestion, SearchFilters,
};
pub use search::JobSearchEngine;
pub use session::{apply_intent, ApplicationSession, SessionReply, SessionState};
