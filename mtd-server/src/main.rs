mod api;
mod application;
mod cli;
mod config;
mod jwt_auth;
mod llm;
mod registry;
mod storage;

use crate::{
    application::{Application, ProblemDb, PromptDb},
    registry::ConfigRegistry,
};

use anyhow::Result;
use clap::Parser;
use tokio::{net::TcpListener, spawn};
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = cli::Arguments::parse();
    let config = config::load_config(&args.config)?;

    let store = storage::create_kv_store(&config.storage).await?;
    info!("using storage engine: {}", store.description());

    let (llm, llm_description) = llm::initialize_llm(&config.llm)?;
    info!("using LLM backend: {llm_description}");

    // 起動時に 1 回解決しておく。空ストレージはここで播種される
    let registry = ConfigRegistry::new(store.clone());
    let initial = registry.resolve().await;
    match &initial.current {
        Some(current) => info!("resolved active config: {} ({})", current.name, current.id.0),
        None => warn!("no active config resolved: {:?}", initial.error),
    }

    // 解決のたびに流れてくるスナップショットをログに残す
    let mut snapshot_updates = registry.subscribe();
    spawn(async move {
        while snapshot_updates.changed().await.is_ok() {
            let current_name = snapshot_updates.borrow().current.as_ref().map(|c| c.name.clone());
            debug!("configuration snapshot updated; current = {current_name:?}");
        }
    });

    let application = Application {
        registry,
        problems: ProblemDb::new(store.clone()),
        prompts: PromptDb::new(store),
        llm,
        public_api_key: config.llm.gemini.public_api_key.clone(),
    };
    let app_service = api::routes(&config.admin_api).with_state(application);

    let listener = TcpListener::bind(config.admin_api.bind_address).await?;
    info!("admin API listening on {}", config.admin_api.bind_address);
    axum::serve(listener, app_service).await?;
    Ok(())
}
