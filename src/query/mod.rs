pub mod embedding;
pub mod engine;
pub mod formatter;

pub use embedding::{EMBED_BATCH_SIZE, EmbeddingEngine};
pub use engine::{QueryEngine, SearchMode};
pub use formatter::{Chunk, FormattedChunks, format_hierarchical};
