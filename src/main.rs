use std::path::PathBuf;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::http::header;
use actix_web::middleware::Logger;
use actix_web::{App, HttpServer, web};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use agile_forge::app_config::AppConfig;
use agile_forge::jira_client::{IssueTracker, JiraClient, UnconfiguredTracker};
use agile_forge::jira_handlers::{AppState, configure};
use agile_forge::llm_handler::{LlmClient, TextGenerator};

#[derive(Debug, Parser)]
#[command(name = "agile-forge", about = "AI assistant backend for Jira Agile artifacts")]
struct Cli {
    /// Address to bind, overrides HOST
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on, overrides PORT
    #[arg(long)]
    port: Option<u16>,

    /// Load environment variables from this file instead of ./.env
    #[arg(long)]
    env_file: Option<PathBuf>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let cli = Cli::parse();

    match &cli.env_file {
        Some(path) => {
            if let Err(e) = dotenv::from_path(path) {
                eprintln!("Failed to load {}: {}", path.display(), e);
            }
        }
        None => {
            dotenv::dotenv().ok();
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut config = AppConfig::from_env();
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    for name in config.validate() {
        warn!("{} is not set", name);
    }

    let issue_tracker: Arc<dyn IssueTracker> = match JiraClient::new(&config.jira) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            warn!("Jira client unavailable: {}", e);
            Arc::new(UnconfiguredTracker::new(e.to_string()))
        }
    };
    let generator: Arc<dyn TextGenerator> = Arc::new(LlmClient::new(config.llm.clone()));

    let app_state = web::Data::new(AppState {
        issue_tracker,
        generator,
        task_issue_type: config.jira.task_issue_type.clone(),
        testcase_issue_type: config.jira.testcase_issue_type.clone(),
        link_type: config.jira.link_type.clone(),
    });

    let bind_addr = (config.server.host.clone(), config.server.port);
    info!("Starting server at http://{}:{}", bind_addr.0, bind_addr.1);

    HttpServer::new(move || {
        // Prototype posture: any origin may call the API
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST"])
            .allowed_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION]);

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .app_data(app_state.clone())
            .configure(configure)
    })
    .bind(bind_addr)?
    .run()
    .await
}
