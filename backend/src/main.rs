mod campaign;
mod config;
mod error;
mod job_controller;
mod services;

use crate::campaign::transport;
use crate::config::AppConfig;
use crate::job_controller::state::JobsState;
use crate::services::campaign::{history, CampaignContext};
use actix_web::{web, App, HttpServer};
use env_logger::Env;
use log::info;
use std::io;
use tokio::sync::mpsc;

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(io::Error::other)?;
    let mail_transport = transport::from_config(&config).map_err(io::Error::other)?;

    // Create the history table before accepting requests
    let conn = history::open(&config.db_path).map_err(io::Error::other)?;
    history::init_schema(&conn).map_err(io::Error::other)?;
    drop(conn);

    // Initialize job controller state
    let (tx, rx) = mpsc::channel(100);
    let jobs_state = JobsState::new(tx);

    // Start job updater task
    let updater_state = jobs_state.clone();
    tokio::spawn(async move {
        job_controller::state::start_job_updater(updater_state, rx).await;
    });

    let context = CampaignContext::new(&config, mail_transport);
    let host = config.host.clone();
    let port = config.port;

    info!("Server running at http://{}:{}", host, port);
    info!(
        "Campaign logs in {}, history in {}",
        context.log_root.display(),
        context.db_path.display()
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::JsonConfig::default().limit(10 * 1024 * 1024)) // 10 MB
            .app_data(web::Data::new(jobs_state.clone()))
            .app_data(web::Data::new(context.clone()))
            .service(services::campaign::configure_routes())
            .service(services::campaign::configure_history_routes())
            .service(services::contacts::configure_routes())
            .service(services::smtp::configure_routes())
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
