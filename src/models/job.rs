use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::user::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "industry")]
pub enum Industry {
    #[serde(rename = "business")]
    #[sqlx(rename = "business")]
    Business,
    #[serde(rename = "information technology")]
    #[sqlx(rename = "information technology")]
    InformationTechnology,
    #[serde(rename = "banking")]
    #[sqlx(rename = "banking")]
    Banking,
    #[serde(rename = "education/training")]
    #[sqlx(rename = "education/training")]
    EducationTraining,
    #[serde(rename = "telecommunication")]
    #[sqlx(rename = "telecommunication")]
    Telecommunication,
    #[serde(rename = "others")]
    #[sqlx(rename = "others")]
    Others,
}

impl sqlx::postgres::PgHasArrayType for Industry {
    fn array_type_info() -> sqlx::postgres::PgTypeInfo {
        sqlx::postgres::PgTypeInfo::with_name("_industry")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "job_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobType {
    Permanent,
    Temporary,
    Internship,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "min_education", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MinEducation {
    Bachelors,
    Masters,
    Phd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "experience_level")]
pub enum Experience {
    #[serde(rename = "no experience")]
    #[sqlx(rename = "no experience")]
    NoExperience,
    #[serde(rename = "1-2 years")]
    #[sqlx(rename = "1-2 years")]
    OneToTwoYears,
    #[serde(rename = "2-5 years")]
    #[sqlx(rename = "2-5 years")]
    TwoToFiveYears,
    #[serde(rename = "5 years+")]
    #[sqlx(rename = "5 years+")]
    FiveYearsPlus,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub email: Option<String>,
    pub address: String,
    pub company: String,
    pub latitude: f64,
    pub longitude: f64,
    pub formatted_address: Option<String>,
    pub city: Option<String>,
    pub zipcode: Option<String>,
    pub country: Option<String>,
    pub industry: Vec<Industry>,
    pub job_type: JobType,
    pub min_education: MinEducation,
    pub experience: Experience,
    pub positions: i32,
    pub salary: Decimal,
    pub posting_date: DateTime<Utc>,
    pub last_date: DateTime<Utc>,
    #[serde(rename = "user")]
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Owners manage their own postings, admins manage any of them.
    pub fn can_be_managed_by(&self, user: &User) -> bool {
        user.role.is_admin() || self.user_id == user.id
    }

    pub fn is_open_for_applications(&self, now: DateTime<Utc>) -> bool {
        self.last_date >= now
    }
}

/// Aggregates for one experience bracket, grouped over all postings whose
/// title matches a topic.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct JobStats {
    pub experience: String,
    pub total_jobs: i64,
    pub avg_positions: f64,
    pub avg_salary: Decimal,
    pub min_salary: Decimal,
    pub max_salary: Decimal,
}

/// One application row joined with the posting it targets.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AppliedJob {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub job: Job,
    pub resume: String,
    pub applied_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;
    use chrono::Duration;

    fn sample_user(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Sam Lee".to_string(),
            email: "sam@example.com".to_string(),
            password_hash: String::new(),
            role,
            reset_password_token: None,
            reset_password_expire: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn sample_job(owner: Uuid) -> Job {
        Job {
            id: Uuid::new_v4(),
            title: "Backend Engineer".to_string(),
            slug: "backend-engineer".to_string(),
            description: "Build and run the posting pipeline".to_string(),
            email: Some("careers@example.com".to_string()),
            address: "Troit St, Boston".to_string(),
            company: "Example Corp".to_string(),
            latitude: 42.35,
            longitude: -71.06,
            formatted_address: Some("Troit St, Boston, MA".to_string()),
            city: Some("Boston".to_string()),
            zipcode: Some("02129".to_string()),
            country: Some("US".to_string()),
            industry: vec![Industry::InformationTechnology],
            job_type: JobType::Permanent,
            min_education: MinEducation::Bachelors,
            experience: Experience::OneToTwoYears,
            positions: 2,
            salary: Decimal::new(95_000, 0),
            posting_date: Utc::now(),
            last_date: Utc::now() + Duration::days(7),
            user_id: owner,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn owner_and_admin_manage_posting() {
        let owner = sample_user(Role::Employeer);
        let job = sample_job(owner.id);

        assert!(job.can_be_managed_by(&owner));
        assert!(job.can_be_managed_by(&sample_user(Role::Admin)));
        assert!(!job.can_be_managed_by(&sample_user(Role::Employeer)));
        assert!(!job.can_be_managed_by(&sample_user(Role::User)));
    }

    #[test]
    fn application_window_closes_after_last_date() {
        let job = sample_job(Uuid::new_v4());
        assert!(job.is_open_for_applications(Utc::now()));
        assert!(!job.is_open_for_applications(job.last_date + Duration::seconds(1)));
    }

    #[test]
    fn enum_wire_strings() {
        assert_eq!(
            serde_json::to_value(Industry::EducationTraining).unwrap(),
            "education/training"
        );
        assert_eq!(
            serde_json::to_value(Experience::FiveYearsPlus).unwrap(),
            "5 years+"
        );
        assert_eq!(serde_json::to_value(JobType::Permanent).unwrap(), "permanent");
        assert_eq!(serde_json::to_value(MinEducation::Phd).unwrap(), "phd");
    }

    #[test]
    fn job_serializes_owner_as_user() {
        let job = sample_job(Uuid::new_v4());
        let value = serde_json::to_value(&job).unwrap();
        let object = value.as_object().unwrap();
        assert!(object.contains_key("user"));
        assert!(object.contains_key("jobType"));
        assert!(object.contains_key("postingDate"));
        assert!(!object.contains_key("user_id"));
    }
}
