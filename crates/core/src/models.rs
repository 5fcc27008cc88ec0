use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScreeningQuestion {
    pub question: String,
    #[serde(rename = "type")]
    pub question_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPosting {
    pub job_id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub experience_required: String,
    pub salary_range: String,
    pub skills_required: Vec<String>,
    pub description: String,
    pub responsibilities: Vec<String>,
    pub qualifications: Vec<String>,
    #[serde(default)]
    pub screening_questions: Vec<ScreeningQuestion>,
}

/// Everything the query engine needs to reconstruct a search result
/// without going back to the corpus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkMetadata {
    pub job_id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub salary_range: String,
    pub experience_required: String,
    pub skills: Vec<String>,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct JobDocument {
    pub text: String,
    pub metadata: ChunkMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobChunk {
    pub chunk_id: String,
    pub chunk_index: u64,
    pub text: String,
    pub metadata: ChunkMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilters {
    pub location: Option<String>,
    pub min_salary: Option<u32>,
    pub experience: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSearchResult {
    pub job_id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub salary_range: String,
    pub experience_required: String,
    pub match_score: f32,
    pub description: String,
    pub skills_required: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScreeningAnswer {
    pub question: String,
    pub answer: String,
    pub question_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApplicationDraft {
    pub job_id: String,
    pub job_title: String,
    pub company: String,
    pub answers: Vec<ScreeningAnswer>,
}

#[derive(Debug, Clone)]
pub struct ResumeFile {
    pub file_name: String,
    pub content: Vec<u8>,
    pub file_type: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ApplicationRecord {
    pub id: i64,
    pub job_id: String,
    pub job_title: String,
    pub company: String,
    pub candidate: CandidateProfile,
    pub status: String,
    pub submitted_at: DateTime<Utc>,
    pub answers: Vec<ScreeningAnswer>,
    pub resume_file_name: Option<String>,
}
