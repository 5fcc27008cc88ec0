use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Parser, Subcommand};
use job_search_core::{
    build_documents, load_postings, split_documents, ApplicationDraft, ApplicationStore,
    CandidateProfile, ChunkingConfig, EmbeddingIndex, HashedNgramEmbedder, IndexConfig,
    IndexState, JobCatalog, JobSearchEngine, ResumeFile, ScreeningAnswer, SearchFilters,
};
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "job-search-engine", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Job corpus JSON file (top-level "jobs" array).
    #[arg(long, env = "JOBS_CORPUS", default_value = "data/jobs.json")]
    corpus: PathBuf,

    /// Directory holding the persisted embedding index.
    #[arg(long, env = "JOBS_INDEX_DIR", default_value = ".job_index")]
    index_dir: PathBuf,

    /// SQLite database for submitted applications.
    #[arg(long, env = "JOBS_DB", default_value = "applications.db")]
    db: PathBuf,
}

#[derive(Subcommand)]
enum Command {
    /// Build the embedding index, or load it when the corpus is unchanged.
    Index,
    /// Search postings semantically with optional structured filters.
    Search {
        /// Search query
        #[arg(long)]
        query: String,
        /// Number of jobs to return.
        #[arg(long, default_value = "5")]
        top_k: usize,
        /// Case-insensitive location substring filter.
        #[arg(long)]
        location: Option<String>,
        /// Minimum salary in LPA; unparseable ranges pass through.
        #[arg(long)]
        min_salary: Option<u32>,
        /// Experience bucket, e.g. "0-2 years" or "2-4 years".
        #[arg(long)]
        experience: Option<String>,
    },
    /// Show one posting in full.
    Show {
        #[arg(long)]
        job_id: String,
    },
    /// List the screening questions of a posting.
    Questions {
        #[arg(long)]
        job_id: String,
    },
    /// Submit an application for a posting.
    Apply {
        #[arg(long)]
        job_id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        location: Option<String>,
        /// Resume file to attach.
        #[arg(long)]
        resume: Option<PathBuf>,
        /// One answer per screening question, in order.
        #[arg(long = "answer")]
        answers: Vec<String>,
    },
    /// List submitted applications for a posting.
    Applications {
        #[arg(long)]
        job_id: String,
    },
}

fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "job-search-engine boot"
    );

    match &cli.command {
        Command::Index => {
            let engine = build_engine(&cli)?;
            println!(
                "index ready: {} postings at {}",
                engine.catalog().len(),
                Utc::now().to_rfc3339()
            );
        }
        Command::Search {
            query,
            top_k,
            location,
            min_salary,
            experience,
        } => {
            let engine = build_engine(&cli)?;
            let filters = SearchFilters {
                location: location.clone(),
                min_salary: *min_salary,
                experience: experience.clone(),
            };
            let filters = if filters == SearchFilters::default() {
                None
            } else {
                Some(filters)
            };

            let results = engine.search_jobs(query, *top_k, filters.as_ref())?;
            println!("query: {query}");
            if results.is_empty() {
                println!("no matching jobs");
            }
            for result in results {
                println!(
                    "[{}] score={:.4} {} at {} ({})",
                    result.job_id,
                    result.match_score,
                    result.title,
                    result.company,
                    result.location
                );
                println!(
                    "  salary={} experience={}",
                    result.salary_range, result.experience_required
                );
                println!("  skills={}", result.skills_required.join(", "));
            }
        }
        Command::Show { job_id } => {
            let engine = build_engine(&cli)?;
            let Some(job) = engine.job(job_id) else {
                bail!("no posting with id {job_id}");
            };
            println!("{} — {} at {}", job.job_id, job.title, job.company);
            println!("location: {}", job.location);
            println!("experience: {}", job.experience_required);
            println!("salary: {}", job.salary_range);
            println!("skills: {}", job.skills_required.join(", "));
            println!("description: {}", job.description);
            for item in &job.responsibilities {
                println!("responsibility: {item}");
            }
            for item in &job.qualifications {
                println!("qualification: {item}");
            }
        }
        Command::Questions { job_id } => {
            let engine = build_engine(&cli)?;
            let questions = engine.screening_questions(job_id);
            if questions.is_empty() {
                println!("no screening questions for {job_id}");
            }
            for (position, question) in questions.iter().enumerate() {
                println!(
                    "{}. [{}] {}",
                    position + 1,
                    question.question_type,
                    question.question
                );
                if let Some(options) = &question.options {
                    println!("   options: {}", options.join(" | "));
                }
            }
        }
        Command::Apply {
            job_id,
            name,
            email,
            phone,
            location,
            resume,
            answers,
        } => {
            let postings = load_postings(&cli.corpus)
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;
            let catalog = JobCatalog::from_postings(&postings);
            let Some(job) = catalog.get(job_id) else {
                bail!("no posting with id {job_id}");
            };

            let questions = catalog.screening_questions(job_id);
            if answers.len() != questions.len() {
                bail!(
                    "{} answers given but {} screening questions expected",
                    answers.len(),
                    questions.len()
                );
            }

            let draft = ApplicationDraft {
                job_id: job.job_id.clone(),
                job_title: job.title.clone(),
                company: job.company.clone(),
                answers: questions
                    .iter()
                    .zip(answers)
                    .map(|(question, answer)| ScreeningAnswer {
                        question: question.question.clone(),
                        answer: answer.clone(),
                        question_type: question.question_type.clone(),
                    })
                    .collect(),
            };
            let candidate = CandidateProfile {
                name: name.clone(),
                email: email.clone(),
                phone: phone.clone(),
                location: location.clone(),
            };
            let resume = resume
                .as_ref()
                .map(|path| -> anyhow::Result<ResumeFile> {
                    let content = fs::read(path)
                        .with_context(|| format!("reading resume {}", path.display()))?;
                    Ok(ResumeFile {
                        file_name: path
                            .file_name()
                            .map(|name| name.to_string_lossy().to_string())
                            .unwrap_or_else(|| "resume".to_string()),
                        content,
                        file_type: path
                            .extension()
                            .map(|ext| ext.to_string_lossy().to_string()),
                    })
                })
                .transpose()?;

            let mut store = ApplicationStore::open(&cli.db)
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;
            let id = store
                .submit(&draft, &candidate, resume.as_ref())
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;
            println!("application {id} submitted for {job_id}");
        }
        Command::Applications { job_id } => {
            let store = ApplicationStore::open(&cli.db)
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;
            let records = store
                .applications_for_job(job_id)
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;
            if records.is_empty() {
                println!("no applications for {job_id}");
            }
            for record in records {
                println!(
                    "#{} {} <{}> status={} submitted_at={}",
                    record.id,
                    record.candidate.name,
                    record.candidate.email,
                    record.status,
                    record.submitted_at.to_rfc3339()
                );
                for answer in &record.answers {
                    println!("  Q: {} A: {}", answer.question, answer.answer);
                }
            }
        }
    }

    Ok(())
}

fn build_engine(cli: &Cli) -> anyhow::Result<JobSearchEngine<HashedNgramEmbedder>> {
    let postings = load_postings(&cli.corpus)
        .with_context(|| format!("loading corpus {}", cli.corpus.display()))?;
    let documents = build_documents(&postings);
    let chunks = split_documents(&documents, ChunkingConfig::default())
        .map_err(|error| anyhow::anyhow!(error.to_string()))?;

    let mut index = EmbeddingIndex::new(
        HashedNgramEmbedder::default(),
        IndexConfig::new(&cli.index_dir),
    );
    index
        .initialize(&cli.corpus, chunks)
        .map_err(|error| anyhow::anyhow!(error.to_string()))?;

    match index.state() {
        IndexState::CacheLoaded => info!(
            index_dir = %cli.index_dir.display(),
            "loaded cached index, corpus unchanged"
        ),
        IndexState::FreshlyBuilt => info!(
            index_dir = %cli.index_dir.display(),
            chunk_count = index.len(),
            "corpus changed or no cache, rebuilt index"
        ),
        _ => {}
    }

    Ok(JobSearchEngine::new(
        index,
        JobCatalog::from_postings(&postings),
    ))
}
