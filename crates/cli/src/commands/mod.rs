pub mod chat;
pub mod init;
pub mod onboard;
pub mod serve;
pub mod status;

use std::sync::Arc;

use minijira_agent::Dispatcher;
use minijira_config::AppConfig;
use minijira_core::store::TicketStore;
use minijira_store::SqliteStore;

pub fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    Ok(AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?)
}

/// Open the configured store and wire a dispatcher over it.
pub async fn build_dispatcher(
    config: &AppConfig,
) -> Result<Dispatcher, Box<dyn std::error::Error>> {
    let provider = minijira_providers::build_from_config(config)?;
    let store: Arc<dyn TicketStore> = Arc::new(SqliteStore::new(&config.store.path).await?);
    let tools = Arc::new(minijira_tools::default_registry(store));
    Ok(Dispatcher::from_config(config, provider, tools))
}
