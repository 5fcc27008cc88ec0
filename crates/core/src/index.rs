use crate::corpus;
use crate::embeddings::Embedder;
use crate::error::IndexError;
use crate::models::JobChunk;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const INDEX_FILE: &str = "index.json";
const DIGEST_FILE: &str = "corpus.sha256";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    Uninitialized,
    CacheLoaded,
    FreshlyBuilt,
    Unavailable,
}

/// Where the index artifact lives. Always passed in explicitly so tests can
/// isolate themselves with temporary directories.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    pub artifact_dir: PathBuf,
}

impl IndexConfig {
    pub fn new(artifact_dir: impl Into<PathBuf>) -> Self {
        Self {
            artifact_dir: artifact_dir.into(),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct PersistedIndex {
    dimensions: usize,
    chunks: Vec<JobChunk>,
    vectors: Vec<Vec<f32>>,
}

pub struct EmbeddingIndex<E: Embedder> {
    embedder: E,
    config: IndexConfig,
    chunks: Vec<JobChunk>,
    vectors: Vec<Vec<f32>>,
    state: IndexState,
}

impl<E: Embedder> EmbeddingIndex<E> {
    pub fn new(embedder: E, config: IndexConfig) -> Self {
        Self {
            embedder,
            config,
            chunks: Vec::new(),
            vectors: Vec::new(),
            state: IndexState::Uninitialized,
        }
    }

    /// Loads the persisted index when its stored corpus digest matches the
    /// current corpus, otherwise embeds `chunks` and persists the result.
    /// Embedding failures are fatal and leave nothing persisted.
    pub fn initialize(&mut self, corpus_path: &Path, chunks: Vec<JobChunk>) -> Result<(), IndexError> {
        match self.load_or_build(corpus_path, chunks) {
            Ok(state) => {
                self.state = state;
                Ok(())
            }
            Err(error) => {
                self.state = IndexState::Unavailable;
                Err(error)
            }
        }
    }

    fn load_or_build(
        &mut self,
        corpus_path: &Path,
        chunks: Vec<JobChunk>,
    ) -> Result<IndexState, IndexError> {
        let digest = corpus::fingerprint(corpus_path)?;

        // A broken or stale artifact is a cache miss, not a failure.
        if let Ok(persisted) = self.load_cached(&digest) {
            self.chunks = persisted.chunks;
            self.vectors = persisted.vectors;
            return Ok(IndexState::CacheLoaded);
        }

        let mut vectors = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            vectors.push(self.embedder.embed(&chunk.text)?);
        }

        self.chunks = chunks;
        self.vectors = vectors;
        self.persist(&digest)?;
        Ok(IndexState::FreshlyBuilt)
    }

    fn load_cached(&self, current_digest: &str) -> Result<PersistedIndex, IndexError> {
        let stored = fs::read_to_string(self.config.artifact_dir.join(DIGEST_FILE))
            .map_err(|error| IndexError::Load(error.to_string()))?;

        if stored.trim() != current_digest {
            return Err(IndexError::Load("corpus digest mismatch".to_string()));
        }

        let bytes = fs::read(self.config.artifact_dir.join(INDEX_FILE))
            .map_err(|error| IndexError::Load(error.to_string()))?;
        let persisted: PersistedIndex = serde_json::from_slice(&bytes)
            .map_err(|error| IndexError::Load(error.to_string()))?;

        if persisted.dimensions != self.embedder.dimensions() {
            return Err(IndexError::Load(format!(
                "persisted dimensions {} != embedder dimensions {}",
                persisted.dimensions,
                self.embedder.dimensions()
            )));
        }
        if persisted.chunks.len() != persisted.vectors.len() {
            return Err(IndexError::Load(
                "chunk count does not match vector count".to_string(),
            ));
        }

        Ok(persisted)
    }

    /// Writes vectors and digest into a staging directory, then renames it
    /// over the artifact directory. A reader never sees a digest without
    /// the vectors that were built beside it.
    fn persist(&self, digest: &str) -> Result<(), IndexError> {
        let artifact_dir = &self.config.artifact_dir;
        let staging = staging_path(artifact_dir);

        if staging.exists() {
            fs::remove_dir_all(&staging)?;
        }
        fs::create_dir_all(&staging)?;

        let persisted = PersistedIndex {
            dimensions: self.embedder.dimensions(),
            chunks: self.chunks.clone(),
            vectors: self.vectors.clone(),
        };
        fs::write(staging.join(INDEX_FILE), serde_json::to_vec(&persisted)?)?;
        fs::write(staging.join(DIGEST_FILE), digest)?;

        if artifact_dir.exists() {
            fs::remove_dir_all(artifact_dir)?;
        }
        fs::rename(&staging, artifact_dir)?;
        Ok(())
    }

    /// Nearest chunks by squared-L2 distance, ascending. Up to `k` entries.
    pub fn query(&self, text: &str, k: usize) -> Result<Vec<(&JobChunk, f32)>, IndexError> {
        if !self.is_ready() {
            return Err(IndexError::NotReady(
                "initialize the index before querying".to_string(),
            ));
        }

        let query_vector = self.embedder.embed(text)?;
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(position, vector)| (position, squared_l2(&query_vector, vector)))
            .collect();

        scored.sort_by(|left, right| left.1.total_cmp(&right.1));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(position, distance)| (&self.chunks[position], distance))
            .collect())
    }

    pub fn state(&self) -> IndexState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, IndexState::CacheLoaded | IndexState::FreshlyBuilt)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

fn staging_path(artifact_dir: &Path) -> PathBuf {
    let name = artifact_dir
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "index".to_string());
    artifact_dir.with_file_name(format!("{name}.staging"))
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "vectors must have same length");
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::{EmbeddingIndex, IndexConfig, IndexState, DIGEST_FILE, INDEX_FILE};
    use crate::embeddings::{Embedder, HashedNgramEmbedder};
    use crate::error::IndexError;
    use crate::models::{ChunkMetadata, JobChunk};
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::tempdir;

    struct CountingEmbedder {
        inner: HashedNgramEmbedder,
        calls: Arc<AtomicUsize>,
    }

    impl Embedder for CountingEmbedder {
        fn dimensions(&self) -> usize {
            self.inner.dimensions()
        }

        fn embed(&self, text: &str) -> Result<Vec<f32>, IndexError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.embed(text)
        }
    }

    struct FailingEmbedder;

    impl Embedder for FailingEmbedder {
        fn dimensions(&self) -> usize {
            8
        }

        fn embed(&self, _text: &str) -> Result<Vec<f32>, IndexError> {
            Err(IndexError::Embedding("provider offline".to_string()))
        }
    }

    fn chunk(job_id: &str, text: &str, index: u64) -> JobChunk {
        JobChunk {
            chunk_id: format!("{job_id}-{index}"),
            chunk_index: index,
            text: text.to_string(),
            metadata: ChunkMetadata {
                job_id: job_id.to_string(),
                title: "Engineer".to_string(),
                company: "Acme".to_string(),
                location: "Remote".to_string(),
                salary_range: "10-15 LPA".to_string(),
                experience_required: "2-4 years".to_string(),
                skills: vec!["Rust".to_string()],
                description: "desc".to_string(),
            },
        }
    }

    fn sample_chunks() -> Vec<JobChunk> {
        vec![
            chunk("JOB001", "machine learning models and feature pipelines", 0),
            chunk("JOB002", "frontend dashboards with typescript components", 1),
        ]
    }

    fn write_corpus(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("jobs.json");
        fs::write(&path, body).unwrap();
        path
    }

    fn counting_index(
        artifact_dir: &Path,
    ) -> (EmbeddingIndex<CountingEmbedder>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let embedder = CountingEmbedder {
            inner: HashedNgramEmbedder { dimensions: 32 },
            calls: Arc::clone(&calls),
        };
        (
            EmbeddingIndex::new(embedder, IndexConfig::new(artifact_dir)),
            calls,
        )
    }

    #[test]
    fn build_persists_and_reload_skips_embedding() {
        let dir = tempdir().unwrap();
        let corpus = write_corpus(dir.path(), "{\"jobs\": []}");
        let artifact_dir = dir.path().join("job_index");

        let (mut index, calls) = counting_index(&artifact_dir);
        index.initialize(&corpus, sample_chunks()).unwrap();
        assert_eq!(index.state(), IndexState::FreshlyBuilt);
        assert!(calls.load(Ordering::SeqCst) > 0);
        assert!(artifact_dir.join(INDEX_FILE).exists());
        assert!(artifact_dir.join(DIGEST_FILE).exists());

        let (mut reloaded, reload_calls) = counting_index(&artifact_dir);
        reloaded.initialize(&corpus, sample_chunks()).unwrap();
        assert_eq!(reloaded.state(), IndexState::CacheLoaded);
        assert_eq!(reload_calls.load(Ordering::SeqCst), 0);
        assert_eq!(reloaded.len(), 2);
    }

    #[test]
    fn corpus_mutation_forces_rebuild() {
        let dir = tempdir().unwrap();
        let corpus = write_corpus(dir.path(), "{\"jobs\": []}");
        let artifact_dir = dir.path().join("job_index");

        let (mut index, _) = counting_index(&artifact_dir);
        index.initialize(&corpus, sample_chunks()).unwrap();

        fs::write(&corpus, "{\"jobs\": [] }").unwrap();

        let (mut rebuilt, calls) = counting_index(&artifact_dir);
        rebuilt.initialize(&corpus, sample_chunks()).unwrap();
        assert_eq!(rebuilt.state(), IndexState::FreshlyBuilt);
        assert!(calls.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn corrupt_artifact_falls_back_to_rebuild() {
        let dir = tempdir().unwrap();
        let corpus = write_corpus(dir.path(), "{\"jobs\": []}");
        let artifact_dir = dir.path().join("job_index");

        let (mut index, _) = counting_index(&artifact_dir);
        index.initialize(&corpus, sample_chunks()).unwrap();

        fs::write(artifact_dir.join(INDEX_FILE), b"not json").unwrap();

        let (mut recovered, calls) = counting_index(&artifact_dir);
        recovered.initialize(&corpus, sample_chunks()).unwrap();
        assert_eq!(recovered.state(), IndexState::FreshlyBuilt);
        assert!(calls.load(Ordering::SeqCst) >= 1);
        assert_eq!(recovered.query("machine learning", 1).unwrap().len(), 1);
    }

    #[test]
    fn query_before_initialize_is_rejected() {
        let dir = tempdir().unwrap();
        let (index, _) = counting_index(&dir.path().join("job_index"));
        let result = index.query("anything", 3);
        assert!(matches!(result, Err(IndexError::NotReady(_))));
    }

    #[test]
    fn embedding_failure_is_fatal_and_persists_nothing() {
        let dir = tempdir().unwrap();
        let corpus = write_corpus(dir.path(), "{\"jobs\": []}");
        let artifact_dir = dir.path().join("job_index");

        let mut index = EmbeddingIndex::new(FailingEmbedder, IndexConfig::new(&artifact_dir));
        let result = index.initialize(&corpus, sample_chunks());

        assert!(matches!(result, Err(IndexError::Embedding(_))));
        assert_eq!(index.state(), IndexState::Unavailable);
        assert!(!artifact_dir.exists());
        assert!(matches!(index.query("x", 1), Err(IndexError::NotReady(_))));
    }

    #[test]
    fn query_orders_by_distance_ascending() {
        let dir = tempdir().unwrap();
        let corpus = write_corpus(dir.path(), "{\"jobs\": []}");

        let (mut index, _) = counting_index(&dir.path().join("job_index"));
        index.initialize(&corpus, sample_chunks()).unwrap();

        let hits = index
            .query("machine learning models and feature pipelines", 2)
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].0.metadata.job_id, "JOB001");
        assert!(hits[0].1 <= hits[1].1);
        assert!(hits[0].1 < 1e-5);
    }

    #[test]
    fn query_truncates_to_k() {
        let dir = tempdir().unwrap();
        let corpus = write_corpus(dir.path(), "{\"jobs\": []}");

        let (mut index, _) = counting_index(&dir.path().join("job_index"));
        index.initialize(&corpus, sample_chunks()).unwrap();

        assert_eq!(index.query("dashboards", 1).unwrap().len(), 1);
        assert_eq!(index.query("dashboards", 10).unwrap().len(), 2);
    }
}
