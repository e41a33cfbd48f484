pub mod auth_dto;
pub mod job_dto;
pub mod response;
pub mod user_dto;
