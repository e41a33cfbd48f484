pub mod geocoder_service;
pub mod job_service;
pub mod mail_service;
pub mod user_service;
