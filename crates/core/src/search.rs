use crate::corpus::JobCatalog;
use crate::embeddings::Embedder;
use crate::error::IndexError;
use crate::index::EmbeddingIndex;
use crate::models::{JobPosting, JobSearchResult, ScreeningQuestion, SearchFilters};
use std::collections::HashSet;

/// Each bucket label maps to the experience substrings that satisfy it.
/// Labels not listed here pass through unfiltered.
const EXPERIENCE_BUCKETS: &[(&str, &[&str])] = &[
    ("0-2 years", &["0-2", "0-1", "1-2"]),
    ("2-4 years", &["2-4", "2-3", "3-4"]),
];

// Chunks fetched per requested result, to survive dedup and filtering.
const OVERFETCH_FACTOR: usize = 4;

pub struct JobSearchEngine<E: Embedder> {
    index: EmbeddingIndex<E>,
    catalog: JobCatalog,
}

impl<E: Embedder> JobSearchEngine<E> {
    pub fn new(index: EmbeddingIndex<E>, catalog: JobCatalog) -> Self {
        Self { index, catalog }
    }

    /// Nearest unique jobs for `query`, best chunk per job, filtered and
    /// truncated to `k`. Results come back score-descending.
    pub fn search_jobs(
        &self,
        query: &str,
        k: usize,
        filters: Option<&SearchFilters>,
    ) -> Result<Vec<JobSearchResult>, IndexError> {
        let fetch = k.saturating_mul(OVERFETCH_FACTOR).max(k);
        let hits = self.index.query(query, fetch)?;

        let mut seen_jobs = HashSet::new();
        let mut results = Vec::new();

        for (chunk, distance) in hits {
            // First chunk seen per job is its closest one; once a job is
            // consumed here it is not reconsidered, filtered or not.
            if !seen_jobs.insert(chunk.metadata.job_id.clone()) {
                continue;
            }

            let result = JobSearchResult {
                job_id: chunk.metadata.job_id.clone(),
                title: chunk.metadata.title.clone(),
                company: chunk.metadata.company.clone(),
                location: chunk.metadata.location.clone(),
                salary_range: chunk.metadata.salary_range.clone(),
                experience_required: chunk.metadata.experience_required.clone(),
                match_score: 1.0 / (1.0 + distance),
                description: chunk.metadata.description.clone(),
                skills_required: chunk.metadata.skills.clone(),
            };

            if let Some(filters) = filters {
                if !passes_filters(&result, filters) {
                    continue;
                }
            }

            results.push(result);
        }

        results.truncate(k);
        Ok(results)
    }

    pub fn job(&self, job_id: &str) -> Option<&JobPosting> {
        self.catalog.get(job_id)
    }

    pub fn screening_questions(&self, job_id: &str) -> &[ScreeningQuestion] {
        self.catalog.screening_questions(job_id)
    }

    pub fn catalog(&self) -> &JobCatalog {
        &self.catalog
    }
}

fn passes_filters(result: &JobSearchResult, filters: &SearchFilters) -> bool {
    if let Some(location) = &filters.location {
        if !result
            .location
            .to_lowercase()
            .contains(&location.to_lowercase())
        {
            return false;
        }
    }

    if let Some(min_salary) = filters.min_salary {
        // Fail-open: an unparseable salary range never drops a result.
        if let Some(salary_min) = parse_min_salary(&result.salary_range) {
            if salary_min < min_salary {
                return false;
            }
        }
    }

    if let Some(bucket) = &filters.experience {
        if let Some(accepted) = bucket_substrings(bucket) {
            let experience = result.experience_required.to_lowercase();
            if !accepted.iter().any(|needle| experience.contains(needle)) {
                return false;
            }
        }
    }

    true
}

/// Leading integer of a `"<min>-<max> LPA"` range, `None` when the range
/// does not start with digits.
fn parse_min_salary(salary_range: &str) -> Option<u32> {
    let head = salary_range.split('-').next()?.trim();
    let digits: String = head.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

fn bucket_substrings(bucket: &str) -> Option<&'static [&'static str]> {
    EXPERIENCE_BUCKETS
        .iter()
        .find(|(label, _)| *label == bucket)
        .map(|(_, accepted)| *accepted)
}
