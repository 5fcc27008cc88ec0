use crate::error::IndexError;
use crate::models::{JobChunk, JobDocument};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            overlap: 50,
        }
    }
}

impl ChunkingConfig {
    fn validate(&self) -> Result<(), IndexError> {
        if self.chunk_size == 0 || self.overlap >= self.chunk_size {
            return Err(IndexError::InvalidChunkConfig(format!(
                "chunk_size {} must exceed overlap {}",
                self.chunk_size, self.overlap
            )));
        }
        Ok(())
    }
}

/// Splits documents into overlapping char windows. Each chunk inherits its
/// parent metadata unmodified; a document of at most `chunk_size` chars
/// yields exactly one chunk.
pub fn split_documents(
    documents: &[JobDocument],
    config: ChunkingConfig,
) -> Result<Vec<JobChunk>, IndexError> {
    config.validate()?;

    let stride = config.chunk_size - config.overlap;
    let mut chunks = Vec::new();
    let mut cursor = 0u64;

    for document in documents {
        let chars: Vec<char> = document.text.chars().collect();

        let mut start = 0;
        loop {
            let end = (start + config.chunk_size).min(chars.len());
            let text: String = chars[start..end].iter().collect();

            chunks.push(JobChunk {
                chunk_id: make_chunk_id(&document.metadata.job_id, cursor, &text),
                chunk_index: cursor,
                text,
                metadata: document.metadata.clone(),
            });
            cursor = cursor.saturating_add(1);

            if end == chars.len() {
                break;
            }
            start += stride;
        }
    }

    Ok(chunks)
}

fn make_chunk_id(job_id: &str, index: u64, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(job_id.as_bytes());
    hasher.update(index.to_le_bytes());
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::{split_documents, ChunkingConfig};
    use crate::error::IndexError;
    use crate::models::{ChunkMetadata, JobDocument};

    fn document(text: &str) -> JobDocument {
        JobDocument {
            text: text.to_string(),
            metadata: ChunkMetadata {
                job_id: "JOB001".to_string(),
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

    #[test]
    fn short_document_yields_one_chunk() {
        let config = ChunkingConfig {
            chunk_size: 100,
            overlap: 10,
        };
        let chunks = split_documents(&[document("a short posting")], config).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "a short posting");
    }

    #[test]
    fn long_document_overlaps_between_consecutive_chunks() {
        let config = ChunkingConfig {
            chunk_size: 10,
            overlap: 4,
        };
        let text: String = ('a'..='z').cycle().take(20).collect();
        let chunks = split_documents(&[document(&text)], config).unwrap();

        assert!(chunks.len() >= 2);
        for window in chunks.windows(2) {
            let tail: String = window[0].text.chars().skip(10 - 4).collect();
            assert!(window[1].text.starts_with(&tail));
        }
        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= 10);
        }
    }

    #[test]
    fn chunks_inherit_parent_metadata() {
        let config = ChunkingConfig {
            chunk_size: 8,
            overlap: 2,
        };
        let chunks = split_documents(&[document("metadata must survive splitting")], config)
            .unwrap();

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert_eq!(chunk.metadata.job_id, "JOB001");
            assert_eq!(chunk.metadata.salary_range, "10-15 LPA");
        }
    }

    #[test]
    fn splitting_is_deterministic() {
        let config = ChunkingConfig::default();
        let documents = vec![document("the same input must chunk the same way every time")];
        let first = split_documents(&documents, config).unwrap();
        let second = split_documents(&documents, config).unwrap();

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.chunk_id, b.chunk_id);
            assert_eq!(a.text, b.text);
        }
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk_size() {
        let config = ChunkingConfig {
            chunk_size: 10,
            overlap: 10,
        };
        let result = split_documents(&[document("x")], config);
        assert!(matches!(result, Err(IndexError::InvalidChunkConfig(_))));
    }
}
