use crate::storage::SqliteStore;
use crate::{Error, Result};
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

/// Entities embedded per model call
pub const EMBED_BATCH_SIZE: usize = 32;

/// Engine for generating text embeddings using local transformer models
pub struct EmbeddingEngine {
    model: TextEmbedding,
}

impl EmbeddingEngine {
    /// Create a new embedding engine with the default model
    pub fn new() -> Result<Self> {
        let mut options = InitOptions::default();
        options.model_name = EmbeddingModel::AllMiniLML6V2;
        options.show_download_progress = true;

        let model = TextEmbedding::try_new(options)
            .map_err(|e| Error::Embedding(format!("Failed to load embedding model: {}", e)))?;

        Ok(Self { model })
    }

    /// Embed entity descriptions, keyed text first so short descriptions
    /// still carry the entity path.
    pub fn embed_descriptions(&self, entities: &[(String, String)]) -> Result<Vec<Vec<f32>>> {
        if entities.is_empty() {
            return Ok(vec![]);
        }

        let inputs: Vec<String> = entities
            .iter()
            .map(|(name, description)| embedding_text(name, description))
            .collect();

        self.model
            .embed(inputs, Some(EMBED_BATCH_SIZE))
            .map_err(|e| Error::Embedding(format!("Embedding generation failed: {}", e)))
    }

    /// Generate a single embedding for a query
    pub fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        let mut embeddings = self
            .model
            .embed(vec![query.to_string()], None)
            .map_err(|e| Error::Embedding(format!("Query embedding failed: {}", e)))?;

        if embeddings.is_empty() {
            return Err(Error::Embedding("Model returned no query embedding".to_string()));
        }
        Ok(embeddings.remove(0))
    }

    /// Embed every entity that has no vector yet. Returns the number stored.
    pub fn index_pending(&self, store: &SqliteStore, mut on_batch: impl FnMut(usize, usize)) -> Result<usize> {
        let pending = store.entities_without_embedding()?;
        let total = pending.len();
        let mut done = 0;

        for batch in pending.chunks(EMBED_BATCH_SIZE) {
            let vectors = self.embed_descriptions(batch)?;
            for ((name, _), vector) in batch.iter().zip(vectors.iter()) {
                store.insert_embedding(name, vector)?;
            }
            done += batch.len();
            tracing::debug!(done, total, "Embedded batch");
            on_batch(done, total);
        }

        tracing::info!(embedded = done, "Embedding pass complete");
        Ok(done)
    }
}

fn embedding_text(name: &str, description: &str) -> String {
    if description.is_empty() {
        name.to_string()
    } else {
        format!("{}\n{}", name, description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_text_prefixes_key() {
        assert_eq!(embedding_text("PII", ""), "PII");
        assert_eq!(
            embedding_text("Table:db.users", "Table: users"),
            "Table:db.users\nTable: users"
        );
    }
}
