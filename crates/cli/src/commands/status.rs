//! `shoplist status`: Summarize the database.

use shoplist_config::AppConfig;
use shoplist_core::{ItemRepository, ListRepository, MemoryRepository, Store};
use shoplist_store::SqliteStore;

/// One line of the status table.
#[derive(Debug, PartialEq, Eq)]
pub struct ListSummary {
    pub id: i64,
    pub name: String,
    pub open: usize,
    pub done: usize,
    pub suggestions: usize,
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    println!("Shoplist Status");
    println!("===============");
    println!("  Config dir:  {}", AppConfig::config_dir().display());
    println!("  Database:    {}", config.database.path);
    println!(
        "  Gateway:     {}:{}",
        config.gateway.host, config.gateway.port
    );
    println!(
        "  PIN:         {}",
        if config.auth_enabled() { "required" } else { "disabled" }
    );
    println!("  Session TTL: {}h", config.auth.session_ttl_hours);

    tracing::debug!(path = %config.database.path, "Opening database");
    let store = SqliteStore::new(&config.database.path).await?;
    let summaries = summarize(&store).await?;
    store.close().await;

    println!();
    if summaries.is_empty() {
        println!("  No lists yet. `shoplist serve` creates \"{}\".", config.lists.default_name);
    }
    for s in &summaries {
        println!(
            "  [{}] {:<24} {} open, {} done, {} suggestions",
            s.id, s.name, s.open, s.done, s.suggestions
        );
    }

    Ok(())
}

/// Count open items, completed items, and suggestions for every list.
pub async fn summarize(store: &dyn Store) -> shoplist_core::Result<Vec<ListSummary>> {
    let mut summaries = Vec::new();
    for list in store.list_all().await? {
        let items = store.items_for(list.id).await?;
        let done = items.iter().filter(|i| i.completed).count();
        summaries.push(ListSummary {
            id: list.id,
            open: items.len() - done,
            done,
            suggestions: store.suggestions(list.id).await?.len(),
            name: list.name,
        });
    }
    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shoplist_store::InMemoryStore;

    #[tokio::test]
    async fn summarize_counts_per_list() {
        let store = InMemoryStore::new();
        let main = store.ensure_default("Main List").await.unwrap().unwrap();
        let milk = store.add_item(main.id, "milk").await.unwrap().unwrap();
        store.add_item(main.id, "eggs").await.unwrap();
        let tea = store.add_item(main.id, "tea").await.unwrap().unwrap();
        store.toggle_completed(milk.id).await.unwrap();
        store.delete_item(tea.id).await.unwrap();
        let empty = store.create_list("Hardware").await.unwrap();

        let summaries = summarize(&store).await.unwrap();
        assert_eq!(
            summaries,
            vec![
                ListSummary {
                    id: main.id,
                    name: "Main List".into(),
                    open: 1,
                    done: 1,
                    suggestions: 1,
                },
                ListSummary {
                    id: empty.id,
                    name: "Hardware".into(),
                    open: 0,
                    done: 0,
                    suggestions: 0,
                },
            ]
        );
    }
}
