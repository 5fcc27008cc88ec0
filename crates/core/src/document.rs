use crate::models::{ChunkMetadata, JobDocument, JobPosting};

/// Renders one embeddable document per posting. The field order is fixed;
/// it affects embedding quality only, never correctness.
pub fn build_documents(postings: &[JobPosting]) -> Vec<JobDocument> {
    postings.iter().map(compose_document).collect()
}

fn compose_document(posting: &JobPosting) -> JobDocument {
    let text = format!(
        "Job ID: {}\nTitle: {}\nCompany: {}\nLocation: {}\nExperience Required: {}\nSalary Range: {}\nSkills: {}\nDescription: {}\nResponsibilities: {}\nQualifications: {}",
        posting.job_id,
        posting.title,
        posting.company,
        posting.location,
        posting.experience_required,
        posting.salary_range,
        posting.skills_required.join(", "),
        posting.description,
        posting.responsibilities.join(". "),
        posting.qualifications.join(". "),
    );

    JobDocument {
        text,
        metadata: ChunkMetadata {
            job_id: posting.job_id.clone(),
            title: posting.title.clone(),
            company: posting.company.clone(),
            location: posting.location.clone(),
            salary_range: posting.salary_range.clone(),
            experience_required: posting.experience_required.clone(),
            skills: posting.skills_required.clone(),
            description: posting.description.clone(),
        },
    }
}
