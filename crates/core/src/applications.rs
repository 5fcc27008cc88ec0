use crate::error::StoreError;
use crate::models::{
    ApplicationDraft, ApplicationRecord, CandidateProfile, ResumeFile, ScreeningAnswer,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS applications (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    job_id TEXT NOT NULL,
    job_title TEXT NOT NULL,
    company TEXT NOT NULL,
    candidate_name TEXT NOT NULL,
    candidate_email TEXT NOT NULL,
    candidate_phone TEXT,
    candidate_location TEXT,
    status TEXT NOT NULL DEFAULT 'submitted',
    submitted_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS screening_responses (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    application_id INTEGER NOT NULL REFERENCES applications(id) ON DELETE CASCADE,
    question TEXT NOT NULL,
    answer TEXT NOT NULL,
    question_type TEXT
);
CREATE TABLE IF NOT EXISTS resumes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    application_id INTEGER NOT NULL REFERENCES applications(id) ON DELETE CASCADE,
    file_name TEXT NOT NULL,
    file_content BLOB NOT NULL,
    file_type TEXT,
    uploaded_at TEXT NOT NULL
);
";

/// Relational store for submitted applications, their screening answers,
/// and resume blobs.
pub struct ApplicationStore {
    conn: Connection,
}

impl ApplicationStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Persists one application atomically: row, screening responses, and
    /// the resume blob commit together or not at all.
    pub fn submit(
        &mut self,
        draft: &ApplicationDraft,
        candidate: &CandidateProfile,
        resume: Option<&ResumeFile>,
    ) -> Result<i64, StoreError> {
        if draft.job_id.is_empty() {
            return Err(StoreError::InvalidRecord("empty job_id".to_string()));
        }

        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO applications
                (job_id, job_title, company, candidate_name, candidate_email,
                 candidate_phone, candidate_location, status, submitted_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'submitted', ?8)",
            params![
                draft.job_id,
                draft.job_title,
                draft.company,
                candidate.name,
                candidate.email,
                candidate.phone,
                candidate.location,
                now,
            ],
        )?;
        let application_id = tx.last_insert_rowid();

        for answer in &draft.answers {
            tx.execute(
                "INSERT INTO screening_responses (application_id, question, answer, question_type)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    application_id,
                    answer.question,
                    answer.answer,
                    answer.question_type
                ],
            )?;
        }

        if let Some(resume) = resume {
            tx.execute(
                "INSERT INTO resumes (application_id, file_name, file_content, file_type, uploaded_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    application_id,
                    resume.file_name,
                    resume.content,
                    resume.file_type,
                    now
                ],
            )?;
        }

        tx.commit()?;
        Ok(application_id)
    }

    pub fn application(&self, id: i64) -> Result<Option<ApplicationRecord>, StoreError> {
        let record = self
            .conn
            .query_row(
                "SELECT id, job_id, job_title, company, candidate_name, candidate_email,
                        candidate_phone, candidate_location, status, submitted_at
                 FROM applications WHERE id = ?1",
                params![id],
                row_to_record,
            )
            .optional()?;

        let Some(mut record) = record else {
            return Ok(None);
        };

        record.answers = self.answers_for(id)?;
        record.resume_file_name = self
            .conn
            .query_row(
                "SELECT file_name FROM resumes WHERE application_id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        Ok(Some(record))
    }

    pub fn applications_for_job(&self, job_id: &str) -> Result<Vec<ApplicationRecord>, StoreError> {
        self.applications_where("job_id = ?1", job_id)
    }

    pub fn applications_for_email(
        &self,
        email: &str,
    ) -> Result<Vec<ApplicationRecord>, StoreError> {
        self.applications_where("candidate_email = ?1", email)
    }

    fn applications_where(
        &self,
        predicate: &str,
        value: &str,
    ) -> Result<Vec<ApplicationRecord>, StoreError> {
        let sql = format!(
            "SELECT id, job_id, job_title, company, candidate_name, candidate_email,
                    candidate_phone, candidate_location, status, submitted_at
             FROM applications WHERE {predicate} ORDER BY submitted_at DESC"
        );
        let mut statement = self.conn.prepare(&sql)?;
        let rows = statement.query_map(params![value], row_to_record)?;

        let mut records = Vec::new();
        for row in rows {
            let mut record = row?;
            record.answers = self.answers_for(record.id)?;
            records.push(record);
        }
        Ok(records)
    }

    pub fn update_status(&self, id: i64, status: &str) -> Result<bool, StoreError> {
        let changed = self.conn.execute(
            "UPDATE applications SET status = ?1 WHERE id = ?2",
            params![status, id],
        )?;
        Ok(changed > 0)
    }

    pub fn resume(&self, application_id: i64) -> Result<Option<ResumeFile>, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT file_name, file_content, file_type FROM resumes WHERE application_id = ?1",
                params![application_id],
                |row| {
                    Ok(ResumeFile {
                        file_name: row.get(0)?,
                        content: row.get(1)?,
                        file_type: row.get(2)?,
                    })
                },
            )
            .optional()?)
    }

    fn answers_for(&self, application_id: i64) -> Result<Vec<ScreeningAnswer>, StoreError> {
        let mut statement = self.conn.prepare(
            "SELECT question, answer, question_type
             FROM screening_responses WHERE application_id = ?1 ORDER BY id",
        )?;
        let rows = statement.query_map(params![application_id], |row| {
            Ok(ScreeningAnswer {
                question: row.get(0)?,
                answer: row.get(1)?,
                question_type: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<ApplicationRecord> {
    let submitted_at: String = row.get(9)?;
    Ok(ApplicationRecord {
        id: row.get(0)?,
        job_id: row.get(1)?,
        job_title: row.get(2)?,
        company: row.get(3)?,
        candidate: CandidateProfile {
            name: row.get(4)?,
            email: row.get(5)?,
            phone: row.get(6)?,
            location: row.get(7)?,
        },
        status: row.get(8)?,
        submitted_at: submitted_at
            .parse::<DateTime<Utc>>()
            .unwrap_or_else(|_| Utc::now()),
        answers: Vec::new(),
        resume_file_name: None,
    })
}

#[cfg(test)]
mod tests {
    use super::ApplicationStore;
    use crate::models::{ApplicationDraft, CandidateProfile, ResumeFile, ScreeningAnswer};

    fn draft() -> ApplicationDraft {
        ApplicationDraft {
            job_id: "JOB001".to_string(),
            job_title: "Backend Engineer".to_string(),
            company: "Acme".to_string(),
            answers: vec![ScreeningAnswer {
                question: "Years of Rust?".to_string(),
                answer: "3".to_string(),
                question_type: "text".to_string(),
            }],
        }
    }

    fn candidate() -> CandidateProfile {
        CandidateProfile {
            name: "Asha Rao".to_string(),
            email: "asha@example.com".to_string(),
            phone: Some("+91 9000000000".to_string()),
            location: None,
        }
    }

    #[test]
    fn submit_and_fetch_round_trip() {
        let mut store = ApplicationStore::open_in_memory().unwrap();
        let id = store.submit(&draft(), &candidate(), None).unwrap();

        let record = store.application(id).unwrap().expect("record exists");
        assert_eq!(record.job_id, "JOB001");
        assert_eq!(record.candidate.email, "asha@example.com");
        assert_eq!(record.status, "submitted");
        assert_eq!(record.answers.len(), 1);
        assert_eq!(record.answers[0].answer, "3");
        assert!(record.resume_file_name.is_none());
    }

    #[test]
    fn missing_application_is_none() {
        let store = ApplicationStore::open_in_memory().unwrap();
        assert!(store.application(42).unwrap().is_none());
    }

    #[test]
    fn resume_blob_survives_round_trip() {
        let mut store = ApplicationStore::open_in_memory().unwrap();
        let resume = ResumeFile {
            file_name: "asha.pdf".to_string(),
            content: vec![0x25, 0x50, 0x44, 0x46],
            file_type: Some("application/pdf".to_string()),
        };
        let id = store.submit(&draft(), &candidate(), Some(&resume)).unwrap();

        let stored = store.resume(id).unwrap().expect("resume exists");
        assert_eq!(stored.file_name, "asha.pdf");
        assert_eq!(stored.content, vec![0x25, 0x50, 0x44, 0x46]);

        let record = store.application(id).unwrap().unwrap();
        assert_eq!(record.resume_file_name.as_deref(), Some("asha.pdf"));
    }

    #[test]
    fn lists_filter_by_job_and_email() {
        let mut store = ApplicationStore::open_in_memory().unwrap();
        store.submit(&draft(), &candidate(), None).unwrap();

        let mut other = draft();
        other.job_id = "JOB002".to_string();
        store.submit(&other, &candidate(), None).unwrap();

        assert_eq!(store.applications_for_job("JOB001").unwrap().len(), 1);
        assert_eq!(store.applications_for_job("JOB003").unwrap().len(), 0);
        assert_eq!(
            store
                .applications_for_email("asha@example.com")
                .unwrap()
                .len(),
            2
        );
    }

    #[test]
    fn status_updates_apply_to_existing_rows_only() {
        let mut store = ApplicationStore::open_in_memory().unwrap();
        let id = store.submit(&draft(), &candidate(), None).unwrap();

        assert!(store.update_status(id, "under_review").unwrap());
        assert!(!store.update_status(999, "under_review").unwrap());

        let record = store.application(id).unwrap().unwrap();
        assert_eq!(record.status, "under_review");
    }

    #[test]
    fn empty_job_id_is_rejected() {
        let mut store = ApplicationStore::open_in_memory().unwrap();
        let mut bad = draft();
        bad.job_id.clear();
        assert!(store.submit(&bad, &candidate(), None).is_err());
    }
}
