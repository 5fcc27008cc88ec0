use crate::error::CorpusError;
use crate::models::{JobPosting, ScreeningQuestion};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Loads the job corpus. The file must be a JSON object with a top-level
/// `"jobs"` array; anything else is a format error, not an io error.
pub fn load_postings(path: &Path) -> Result<Vec<JobPosting>, CorpusError> {
    let bytes = fs::read(path)?;

    let root: Value = serde_json::from_slice(&bytes)
        .map_err(|error| CorpusError::Format(format!("invalid json: {error}")))?;

    let jobs = root
        .get("jobs")
        .ok_or_else(|| CorpusError::Format("missing top-level \"jobs\" collection".to_string()))?;

    serde_json::from_value(jobs.clone())
        .map_err(|error| CorpusError::Format(format!("bad job record: {error}")))
}

pub fn fingerprint(path: &Path) -> Result<String, CorpusError> {
    let bytes = fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

/// Read-only `job_id -> JobPosting` lookup, built once at load time.
pub struct JobCatalog {
    jobs: HashMap<String, JobPosting>,
}

impl JobCatalog {
    pub fn from_postings(postings: &[JobPosting]) -> Self {
        let jobs = postings
            .iter()
            .map(|posting| (posting.job_id.clone(), posting.clone()))
            .collect();
        Self { jobs }
    }

    pub fn get(&self, job_id: &str) -> Option<&JobPosting> {
        self.jobs.get(job_id)
    }

    pub fn screening_questions(&self, job_id: &str) -> &[ScreeningQuestion] {
        self.jobs
            .get(job_id)
            .map(|posting| posting.screening_questions.as_slice())
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
