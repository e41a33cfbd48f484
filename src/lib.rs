pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod query;
pub mod routes;
pub mod services;
pub mod utils;

use sqlx::PgPool;

use crate::error::Result;
use crate::services::{
    geocoder_service::GeocoderService, job_service::JobService, mail_service::MailService,
    user_service::UserService,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub job_service: JobService,
    pub user_service: UserService,
    pub mail_service: MailService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Result<Self> {
        let geocoder = GeocoderService::new()?;
        let job_service = JobService::new(pool.clone(), geocoder);
        let user_service = UserService::new(pool.clone());
        let mail_service = MailService::new()?;

        Ok(Self {
            pool,
            job_service,
            user_service,
            mail_service,
        })
    }
}
