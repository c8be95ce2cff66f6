//! `minijira status` — Show configuration and store status.

use std::sync::Arc;
use std::time::Duration;

use minijira_config::AppConfig;
use minijira_core::store::TicketStore;
use minijira_store::SqliteStore;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;

    println!("Mini-Jira Status");
    println!("================");
    println!("  Config dir:   {}", AppConfig::config_dir().display());
    println!("  Provider:     {}", config.provider);
    println!("  Model:        {}", config.model);
    println!(
        "  Endpoint:     {}",
        config.base_url.as_deref().unwrap_or("(provider default)")
    );
    println!("  API key:      {}", if config.has_api_key() { "set" } else { "not set" });
    println!("  Temperature:  {}", config.temperature);
    println!("  Timeout:      {}s", config.classifier_timeout_secs);
    println!(
        "  History:      last {} messages, {} chars",
        config.history.max_window, config.history.max_chars
    );
    println!("  Gateway:      {}:{}", config.gateway.host, config.gateway.port);
    println!("  Database:     {}", config.store.path.display());

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file — run `minijira onboard` first");
    }

    // Only open an existing database; status must not create one.
    if config.store.path.exists() {
        let store = SqliteStore::new(&config.store.path).await?;
        let (users, tickets) = store.counts().await?;
        println!("  ✅ Database: {users} user(s), {tickets} ticket(s)");

        let tools = minijira_tools::default_registry(Arc::new(store) as Arc<dyn TicketStore>);
        println!("\n  Tools ({}):", tools.len());
        for spec in tools.specs() {
            if spec.required_args.is_empty() {
                println!("    {:<16} {}", spec.name, spec.description);
            } else {
                println!(
                    "    {:<16} {} [{}]",
                    spec.name,
                    spec.description,
                    spec.required_args.join(", ")
                );
            }
        }
    } else {
        println!("  ⚠️  No database — run `minijira init`");
    }

    match minijira_providers::build_from_config(&config) {
        Ok(provider) => {
            let reachable =
                tokio::time::timeout(Duration::from_secs(5), provider.health_check()).await;
            match reachable {
                Ok(Ok(true)) => println!("\n  ✅ Model endpoint reachable"),
                Ok(Ok(false)) => println!("\n  ⚠️  Model endpoint answered with an error"),
                Ok(Err(e)) => println!("\n  ❌ Model endpoint unreachable: {e}"),
                Err(_) => println!("\n  ❌ Model endpoint timed out"),
            }
        }
        Err(e) => println!("\n  ❌ Provider not usable: {e}"),
    }

    Ok(())
}
