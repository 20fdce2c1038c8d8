use std::sync::Arc;

use config::Config;
use services::Services;

pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod middleware;
pub mod models;
pub mod result;
pub mod routes;
pub mod services;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub services: Arc<Services>,
    pub config: Config,
}
