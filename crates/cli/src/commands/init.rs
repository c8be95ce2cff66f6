//! `minijira init` — Create the database schema.

use minijira_store::SqliteStore;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let path = &config.store.path;

    let store = SqliteStore::new(path).await?;
    store.migrate().await?;
    let (users, tickets) = store.counts().await?;
    store.close().await;

    println!("Database ready at {}", path.display());
    println!("  Users:   {users}");
    println!("  Tickets: {tickets}");

    Ok(())
}
