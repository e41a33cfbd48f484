use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use chrono::Utc;
use sqlx::PgPool;
use tracing::{error, warn};
use uuid::Uuid;

use crate::config::get_config;
use crate::dto::job_dto::{CreateJobPayload, UpdateJobPayload};
use crate::error::{Error, Result};
use crate::models::job::{AppliedJob, Job, JobStats};
use crate::models::user::User;
use crate::query::{ListQuery, JOBS};
use crate::services::geocoder_service::{miles_to_radians, GeocoderService};
use crate::utils::slug::slugify;

/// Resume formats accepted on apply.
const RESUME_EXTENSIONS: [&str; 2] = ["pdf", "docx"];

/// A resume picked out of the multipart body.
#[derive(Debug, Clone)]
pub struct ResumeUpload {
    pub filename: String,
    pub bytes: Bytes,
}

#[derive(Clone)]
pub struct JobService {
    pool: PgPool,
    geocoder: GeocoderService,
}

impl JobService {
    pub fn new(pool: PgPool, geocoder: GeocoderService) -> Self {
        Self { pool, geocoder }
    }

    pub async fn list(&self, params: &BTreeMap<String, String>) -> Result<Vec<serde_json::Value>> {
        ListQuery::new(&JOBS, params)
            .filter()
            .sort()
            .limit_fields()
            .search()
            .paginate()
            .to_sql()
            .fetch_json(&self.pool)
            .await
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Job> {
        sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Job not found".to_string()))
    }

    pub async fn get_by_id_and_slug(&self, id: Uuid, slug: &str) -> Result<Job> {
        sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1 AND slug = $2")
            .bind(id)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Job not found".to_string()))
    }

    /// Creates a posting for `user`. The slug comes from the title and the
    /// coordinates from geocoding the submitted address.
    pub async fn create(&self, user: &User, payload: CreateJobPayload) -> Result<Job> {
        let slug = slugify(&payload.title);
        let location = self.geocoder.geocode(&payload.address).await?;

        let job = sqlx::query_as::<_, Job>(
            "INSERT INTO jobs (title, slug, description, email, address, company,
                               latitude, longitude, formatted_address, city, zipcode, country,
                               industry, job_type, min_education, experience,
                               positions, salary, posting_date, last_date, user_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                     $13, $14, $15, $16, $17, $18,
                     COALESCE($19, NOW()),
                     COALESCE($20, NOW() + INTERVAL '7 days'),
                     $21)
             RETURNING *",
        )
        .bind(&payload.title)
        .bind(&slug)
        .bind(&payload.description)
        .bind(&payload.email)
        .bind(&payload.address)
        .bind(&payload.company)
        .bind(location.latitude)
        .bind(location.longitude)
        .bind(&location.formatted_address)
        .bind(&location.city)
        .bind(&location.zipcode)
        .bind(&location.country)
        .bind(&payload.industry)
        .bind(payload.job_type)
        .bind(payload.min_education)
        .bind(payload.experience)
        .bind(payload.positions.unwrap_or(1))
        .bind(payload.salary)
        .bind(payload.posting_date)
        .bind(payload.last_date)
        .bind(user.id)
        .fetch_one(&self.pool)
        .await?;

        Ok(job)
    }

    /// Partial update. Changing the title recomputes the slug, changing the
    /// address reruns geocoding; everything absent keeps its stored value.
    pub async fn update(&self, id: Uuid, user: &User, payload: UpdateJobPayload) -> Result<Job> {
        let job = self.get_by_id(id).await?;
        ensure_can_manage(&job, user)?;

        let slug = payload.title.as_deref().map(slugify);
        let location = match payload.address.as_deref() {
            Some(address) => Some(self.geocoder.geocode(address).await?),
            None => None,
        };

        let updated = sqlx::query_as::<_, Job>(
            "UPDATE jobs SET
                title = COALESCE($2, title),
                slug = COALESCE($3, slug),
                description = COALESCE($4, description),
                email = COALESCE($5, email),
                address = COALESCE($6, address),
                company = COALESCE($7, company),
                latitude = COALESCE($8, latitude),
                longitude = COALESCE($9, longitude),
                formatted_address = COALESCE($10, formatted_address),
                city = COALESCE($11, city),
                zipcode = COALESCE($12, zipcode),
                country = COALESCE($13, country),
                industry = COALESCE($14, industry),
                job_type = COALESCE($15, job_type),
                min_education = COALESCE($16, min_education),
                experience = COALESCE($17, experience),
                positions = COALESCE($18, positions),
                salary = COALESCE($19, salary),
                last_date = COALESCE($20, last_date),
                updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(payload.title)
        .bind(slug)
        .bind(payload.description)
        .bind(payload.email)
        .bind(payload.address)
        .bind(payload.company)
        .bind(location.as_ref().map(|l| l.latitude))
        .bind(location.as_ref().map(|l| l.longitude))
        .bind(location.as_ref().and_then(|l| l.formatted_address.clone()))
        .bind(location.as_ref().and_then(|l| l.city.clone()))
        .bind(location.as_ref().and_then(|l| l.zipcode.clone()))
        .bind(location.as_ref().and_then(|l| l.country.clone()))
        .bind(payload.industry)
        .bind(payload.job_type)
        .bind(payload.min_education)
        .bind(payload.experience)
        .bind(payload.positions)
        .bind(payload.salary)
        .bind(payload.last_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(updated)
    }

    /// Removes a posting along with the resume files of its applications.
    /// Returns the deleted posting.
    pub async fn delete(&self, id: Uuid, user: &User) -> Result<Job> {
        let job = self.get_by_id(id).await?;
        ensure_can_manage(&job, user)?;

        let resumes =
            sqlx::query_scalar::<_, String>("SELECT resume FROM job_applicants WHERE job_id = $1")
                .bind(id)
                .fetch_all(&self.pool)
                .await?;
        remove_resume_files(Path::new(&get_config().upload_dir), &resumes).await;

        sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(job)
    }

    /// Postings within `distance` miles of the geocoded zipcode, by great
    /// circle distance.
    pub async fn jobs_in_radius(&self, zipcode: &str, distance: f64) -> Result<Vec<Job>> {
        let location = self.geocoder.geocode(zipcode).await?;
        let radius = miles_to_radians(distance);

        let jobs = sqlx::query_as::<_, Job>(
            "SELECT * FROM jobs
             WHERE acos(LEAST(1.0, GREATEST(-1.0,
                       sin(radians(latitude)) * sin(radians($1))
                     + cos(radians(latitude)) * cos(radians($1))
                     * cos(radians(longitude - $2))))) <= $3
             ORDER BY posting_date DESC",
        )
        .bind(location.latitude)
        .bind(location.longitude)
        .bind(radius)
        .fetch_all(&self.pool)
        .await?;

        Ok(jobs)
    }

    /// Salary and headcount aggregates per experience bracket for postings
    /// whose title matches `topic`.
    pub async fn stats(&self, topic: &str) -> Result<Vec<JobStats>> {
        let pattern = format!("%{}%", topic);
        let stats = sqlx::query_as::<_, JobStats>(
            "SELECT UPPER(experience::TEXT) AS experience,
                    COUNT(*) AS total_jobs,
                    AVG(positions)::FLOAT8 AS avg_positions,
                    AVG(salary) AS avg_salary,
                    MIN(salary) AS min_salary,
                    MAX(salary) AS max_salary
             FROM jobs
             WHERE title ILIKE $1
             GROUP BY UPPER(experience::TEXT)
             ORDER BY experience",
        )
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;
        Ok(stats)
    }

    /// Files an application with its resume. Checks run in order: the posting
    /// must exist, its window must be open, the applicant must not have
    /// applied before, and only then is the upload validated and stored.
    /// Returns the stored resume filename.
    pub async fn apply(
        &self,
        job_id: Uuid,
        user: &User,
        upload: Option<ResumeUpload>,
    ) -> Result<String> {
        let Some(job) = sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1")
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Err(Error::NotFound("job not found".to_string()));
        };

        if !job.is_open_for_applications(Utc::now()) {
            return Err(Error::ApplicationClosed);
        }

        let already = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM job_applicants WHERE job_id = $1 AND user_id = $2)",
        )
        .bind(job_id)
        .bind(user.id)
        .fetch_one(&self.pool)
        .await?;
        if already {
            return Err(Error::DuplicateApplication);
        }

        let Some(upload) = upload else {
            return Err(Error::InvalidUpload("please upload file".to_string()));
        };

        let config = get_config();
        let extension = validate_resume(&upload.filename, upload.bytes.len(), config.max_file_size)?;
        let stored_name = resume_filename(&user.name, job_id, &extension);

        let upload_dir = PathBuf::from(&config.upload_dir);
        tokio::fs::create_dir_all(&upload_dir).await.map_err(|e| {
            error!(error = %e, "could not create upload directory");
            Error::Internal("resume upload failed".to_string())
        })?;
        let target = upload_dir.join(&stored_name);
        if let Err(e) = tokio::fs::write(&target, &upload.bytes).await {
            error!(path = %target.display(), error = %e, "could not store resume");
            return Err(Error::Internal("resume upload failed".to_string()));
        }

        // The unique constraint backstops the probe above under concurrency.
        let inserted = sqlx::query(
            "INSERT INTO job_applicants (job_id, user_id, resume)
             VALUES ($1, $2, $3)
             ON CONFLICT (job_id, user_id) DO NOTHING",
        )
        .bind(job_id)
        .bind(user.id)
        .bind(&stored_name)
        .execute(&self.pool)
        .await?;
        if inserted.rows_affected() == 0 {
            return Err(Error::DuplicateApplication);
        }

        Ok(stored_name)
    }

    /// Postings the account has applied to, newest application first.
    pub async fn applied_jobs(&self, user_id: Uuid) -> Result<Vec<AppliedJob>> {
        let jobs = sqlx::query_as::<_, AppliedJob>(
            "SELECT j.*, a.resume, a.applied_at
             FROM job_applicants a
             JOIN jobs j ON j.id = a.job_id
             WHERE a.user_id = $1
             ORDER BY a.applied_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(jobs)
    }

    /// Postings the account owns, newest first.
    pub async fn published_jobs(&self, user_id: Uuid) -> Result<Vec<Job>> {
        let jobs =
            sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE user_id = $1 ORDER BY posting_date DESC")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(jobs)
    }
}

// Delete reuses the update wording.
fn ensure_can_manage(job: &Job, user: &User) -> Result<()> {
    if !job.can_be_managed_by(user) {
        return Err(Error::Forbidden(format!(
            "user({}) is not allowed to update this job",
            user.id
        )));
    }
    Ok(())
}

/// Checks extension and size, returning the lowercased extension.
fn validate_resume(filename: &str, size: usize, max_size: usize) -> Result<String> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    let Some(extension) = extension.filter(|e| RESUME_EXTENSIONS.contains(&e.as_str())) else {
        return Err(Error::InvalidUpload("please upload document file".to_string()));
    };

    if size > max_size {
        return Err(Error::InvalidUpload(format!(
            "please upload file that is less than {}mb",
            max_size / (1024 * 1024)
        )));
    }

    Ok(extension)
}

/// Stored resumes are named after the applicant and the posting so a rerun
/// overwrites instead of piling up files.
fn resume_filename(name: &str, job_id: Uuid, extension: &str) -> String {
    format!("{}_{}.{}", name.replace(' ', "_"), job_id, extension)
}

/// Unlinks stored resume files, logging and moving on when one is missing.
pub async fn remove_resume_files(upload_dir: &Path, names: &[String]) {
    for name in names {
        let path = upload_dir.join(name);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            warn!(path = %path.display(), error = %e, "could not remove resume file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_MB: usize = 2 * 1024 * 1024;

    #[test]
    fn accepts_document_resumes() {
        assert_eq!(validate_resume("resume.pdf", 100, TWO_MB).unwrap(), "pdf");
        assert_eq!(validate_resume("cv.docx", 100, TWO_MB).unwrap(), "docx");
        assert_eq!(validate_resume("CV.PDF", 100, TWO_MB).unwrap(), "pdf");
    }

    #[test]
    fn rejects_other_formats() {
        for name in ["resume.txt", "resume.exe", "resume", "resume."] {
            let err = validate_resume(name, 100, TWO_MB).unwrap_err();
            assert!(
                matches!(err, Error::InvalidUpload(ref m) if m == "please upload document file"),
                "unexpected error for {name}: {err:?}"
            );
        }
    }

    #[test]
    fn rejects_oversized_resumes() {
        let err = validate_resume("resume.pdf", TWO_MB + 1, TWO_MB).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidUpload(ref m) if m == "please upload file that is less than 2mb"
        ));
        assert!(validate_resume("resume.pdf", TWO_MB, TWO_MB).is_ok());
    }

    #[test]
    fn resume_filename_is_deterministic() {
        let job_id = Uuid::parse_str("7f8de4c2-4b3a-4f5e-9c6d-1a2b3c4d5e6f").unwrap();
        assert_eq!(
            resume_filename("Sam Lee", job_id, "pdf"),
            format!("Sam_Lee_{}.pdf", job_id)
        );
        assert_eq!(
            resume_filename("Priya", job_id, "docx"),
            format!("Priya_{}.docx", job_id)
        );
    }

    #[test]
    fn removing_missing_files_does_not_fail() {
        tokio_test::block_on(remove_resume_files(
            Path::new("/nonexistent-upload-dir"),
            &["ghost.pdf".to_string()],
        ));
    }
}
