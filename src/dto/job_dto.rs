use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::job::{Experience, Industry, JobType, MinEducation};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobPayload {
    #[validate(length(min = 1, max = 100, message = "please enter job title"))]
    pub title: String,
    #[validate(length(min = 1, max = 1000, message = "please enter job description"))]
    pub description: String,
    #[validate(email(message = "please add valid email address"))]
    pub email: Option<String>,
    #[validate(length(min = 1, message = "please add an address"))]
    pub address: String,
    #[validate(length(min = 1, message = "please add company name"))]
    pub company: String,
    #[validate(length(min = 1, message = "please enter industry for this job"))]
    pub industry: Vec<Industry>,
    pub job_type: JobType,
    pub min_education: MinEducation,
    pub experience: Experience,
    pub positions: Option<i32>,
    pub salary: Decimal,
    pub posting_date: Option<DateTime<Utc>>,
    pub last_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateJobPayload {
    #[validate(length(min = 1, max = 100, message = "please enter job title"))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 1000, message = "please enter job description"))]
    pub description: Option<String>,
    #[validate(email(message = "please add valid email address"))]
    pub email: Option<String>,
    #[validate(length(min = 1, message = "please add an address"))]
    pub address: Option<String>,
    #[validate(length(min = 1, message = "please add company name"))]
    pub company: Option<String>,
    #[validate(length(min = 1, message = "please enter industry for this job"))]
    pub industry: Option<Vec<Industry>>,
    pub job_type: Option<JobType>,
    pub min_education: Option<MinEducation>,
    pub experience: Option<Experience>,
    pub positions: Option<i32>,
    pub salary: Option<Decimal>,
    pub last_date: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_payload() -> CreateJobPayload {
        CreateJobPayload {
            title: "Backend Engineer".to_string(),
            description: "Own the posting pipeline end to end".to_string(),
            email: Some("careers@example.com".to_string()),
            address: "Troit St, Boston".to_string(),
            company: "Example Corp".to_string(),
            industry: vec![Industry::InformationTechnology],
            job_type: JobType::Permanent,
            min_education: MinEducation::Bachelors,
            experience: Experience::OneToTwoYears,
            positions: Some(2),
            salary: Decimal::new(95_000, 0),
            posting_date: None,
            last_date: None,
        }
    }

    #[test]
    fn valid_payload_passes() {
        assert!(valid_payload().validate().is_ok());
    }

    #[test]
    fn oversized_title_is_rejected() {
        let mut payload = valid_payload();
        payload.title = "x".repeat(101);
        assert!(payload.validate().is_err());
    }

    #[test]
    fn empty_industry_is_rejected() {
        let mut payload = valid_payload();
        payload.industry.clear();
        assert!(payload.validate().is_err());
    }

    #[test]
    fn payload_accepts_wire_field_names() {
        let payload: CreateJobPayload = serde_json::from_value(serde_json::json!({
            "title": "Data Engineer",
            "description": "Pipelines",
            "address": "Remote",
            "company": "Example Corp",
            "industry": ["information technology", "others"],
            "jobType": "temporary",
            "minEducation": "masters",
            "experience": "2-5 years",
            "salary": "78000"
        }))
        .unwrap();
        assert_eq!(payload.job_type, JobType::Temporary);
        assert_eq!(payload.experience, Experience::TwoToFiveYears);
        assert_eq!(payload.industry.len(), 2);
    }

    #[test]
    fn out_of_vocabulary_enum_is_rejected() {
        let result = serde_json::from_value::<CreateJobPayload>(serde_json::json!({
            "title": "Data Engineer",
            "description": "Pipelines",
            "address": "Remote",
            "company": "Example Corp",
            "industry": ["freelance"],
            "jobType": "permanent",
            "minEducation": "masters",
            "experience": "2-5 years",
            "salary": "78000"
        }));
        assert!(result.is_err());
    }
}
