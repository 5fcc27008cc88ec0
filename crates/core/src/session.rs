use crate::corpus::JobCatalog;
use crate::models::{ApplicationDraft, ScreeningAnswer, ScreeningQuestion};
use regex::Regex;
use std::sync::OnceLock;

/// Keywords that signal the candidate wants to start an application.
const APPLY_KEYWORDS: &[&str] = &["apply", "interested", "select"];

fn job_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"JOB\d{3}").expect("job id pattern is valid"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Searching,
    AwaitingResume,
    Answering,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionReply {
    /// No application trigger fired; the caller keeps serving search.
    Searching,
    UnknownJob {
        job_id: String,
    },
    ResumeRequested {
        job_id: String,
    },
    Question {
        question: ScreeningQuestion,
        index: usize,
        total: usize,
    },
    Submitted {
        draft: ApplicationDraft,
    },
}

/// One candidate's application flow. Owned by the caller and passed into
/// each conversational turn; holds no reference to shared state.
///
/// Transitions:
/// - `Searching -> AwaitingResume` when the message satisfies
///   [`apply_intent`] and carries a job id known to the catalog.
/// - `AwaitingResume -> Answering` on the next message (the resume step),
///   or straight to submission when the job has no screening questions.
/// - `Answering -> Answering` while questions remain; the final answer
///   submits and resets to `Searching`.
pub struct ApplicationSession {
    state: SessionState,
    selected_job: Option<String>,
    answers: Vec<ScreeningAnswer>,
    question_index: usize,
}

impl ApplicationSession {
    pub fn new() -> Self {
        Self {
            state: SessionState::Searching,
            selected_job: None,
            answers: Vec::new(),
            question_index: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn selected_job(&self) -> Option<&str> {
        self.selected_job.as_deref()
    }

    pub fn handle_message(&mut self, catalog: &JobCatalog, message: &str) -> SessionReply {
        match self.state {
            SessionState::Searching => self.handle_searching(catalog, message),
            SessionState::AwaitingResume => self.handle_resume_received(catalog),
            SessionState::Answering => self.handle_answer(catalog, message),
        }
    }

    pub fn reset(&mut self) {
        self.state = SessionState::Searching;
        self.selected_job = None;
        self.answers.clear();
        self.question_index = 0;
    }

    fn handle_searching(&mut self, catalog: &JobCatalog, message: &str) -> SessionReply {
        let Some(job_id) = apply_intent(message) else {
            return SessionReply::Searching;
        };

        if catalog.get(&job_id).is_none() {
            return SessionReply::UnknownJob { job_id };
        }

        self.selected_job = Some(job_id.clone());
        self.state = SessionState::AwaitingResume;
        SessionReply::ResumeRequested { job_id }
    }

    fn handle_resume_received(&mut self, catalog: &JobCatalog) -> SessionReply {
        let questions = self.current_questions(catalog);

        if questions.is_empty() {
            return self.submit(catalog);
        }

        self.state = SessionState::Answering;
        self.question_index = 0;
        SessionReply::Question {
            question: questions[0].clone(),
            index: 0,
            total: questions.len(),
        }
    }

    fn handle_answer(&mut self, catalog: &JobCatalog, answer: &str) -> SessionReply {
        let questions = self.current_questions(catalog).to_vec();
        if self.question_index >= questions.len() {
            return self.submit(catalog);
        }
        let current = &questions[self.question_index];

        self.answers.push(ScreeningAnswer {
            question: current.question.clone(),
            answer: answer.to_string(),
            question_type: current.question_type.clone(),
        });
        self.question_index += 1;

        if self.question_index < questions.len() {
            return SessionReply::Question {
                question: questions[self.question_index].clone(),
                index: self.question_index,
                total: questions.len(),
            };
        }

        self.submit(catalog)
    }

    fn submit(&mut self, catalog: &JobCatalog) -> SessionReply {
        let job_id = self.selected_job.take().unwrap_or_default();
        let (job_title, company) = catalog
            .get(&job_id)
            .map(|job| (job.title.clone(), job.company.clone()))
            .unwrap_or_default();

        let draft = ApplicationDraft {
            job_id,
            job_title,
            company,
            answers: std::mem::take(&mut self.answers),
        };

        self.reset();
        SessionReply::Submitted { draft }
    }

    fn current_questions<'a>(&self, catalog: &'a JobCatalog) -> &'a [ScreeningQuestion] {
        self.selected_job
            .as_deref()
            .map(|job_id| catalog.screening_questions(job_id))
            .unwrap_or(&[])
    }
}

impl Default for ApplicationSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Trigger predicate: a message starts an application when it contains one
/// of [`APPLY_KEYWORDS`] (case-insensitive) and names a `JOB###` id. The
/// first id mentioned wins.
pub fn apply_intent(message: &str) -> Option<String> {
    let lowered = message.to_lowercase();
    if !APPLY_KEYWORDS.iter().any(|keyword| lowered.contains(keyword)) {
        return None;
    }

    job_id_pattern()
        .find(&message.to_uppercase())
        .map(|found| found.as_str().to_string())
}
