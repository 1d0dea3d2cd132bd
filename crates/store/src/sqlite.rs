//! SQLite store backed by an `sqlx` connection pool.
//!
//! Uses a single SQLite database file with three tables:
//! - `lists`: the named lists
//! - `items`: list entries, `list_id` references `lists`
//! - `item_memory`: remembered names of deleted items, unique per list
//!
//! Multi-statement operations run in one transaction. Invariant guards are
//! folded into the first write statement so concurrent requests cannot both
//! pass a check before either writes.

use async_trait::async_trait;
use shoplist_core::{
    InvariantViolation, Item, ItemRepository, List, ListRepository, MemoryRepository, Store,
    StoreError, ValidationError, normalize_name,
};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

const ITEM_COLUMNS: &str = "id, list_id, name, completed";

/// A production SQLite store.
pub struct SqliteStore {
    pool: SqlitePool,
}

/// Wrap an sqlx error with the operation that produced it.
fn query_failed(op: &'static str) -> impl Fn(sqlx::Error) -> StoreError {
    move |e| StoreError::QueryFailed(format!("{op}: {e}"))
}

impl SqliteStore {
    /// Open (or create) a database at `path` and run migrations.
    ///
    /// Pass `"sqlite::memory:"` for an in-process ephemeral database (useful
    /// for tests). In-memory databases use a single connection that is never
    /// recycled, since the data lives only as long as that connection.
    pub async fn new(path: &str) -> Result<Self, StoreError> {
        let in_memory = path.contains(":memory:") || path.contains("mode=memory");

        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| StoreError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .pragma("foreign_keys", "ON");

        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(4)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite store initialized at {path}");
        Ok(store)
    }

    /// Close the pool, waiting for in-flight queries.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Run schema migrations: creates tables and indexes, upgrades legacy
    /// databases whose `items` table predates multiple lists.
    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS lists (
                id    INTEGER PRIMARY KEY AUTOINCREMENT,
                name  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("lists table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS items (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                list_id    INTEGER REFERENCES lists(id) ON DELETE CASCADE,
                name       TEXT NOT NULL,
                completed  BOOLEAN NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("items table: {e}")))?;

        // Single-list databases have no list_id; bootstrap adopts those rows.
        let has_list_id: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM pragma_table_info('items') WHERE name = 'list_id'",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("items schema probe: {e}")))?;

        if has_list_id == 0 {
            sqlx::query(
                "ALTER TABLE items ADD COLUMN list_id INTEGER REFERENCES lists(id) ON DELETE CASCADE",
            )
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::MigrationFailed(format!("items.list_id column: {e}")))?;
            info!("Upgraded legacy items table with list_id column");
        }

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS item_memory (
                id       INTEGER PRIMARY KEY AUTOINCREMENT,
                list_id  INTEGER NOT NULL REFERENCES lists(id) ON DELETE CASCADE,
                name     TEXT NOT NULL,
                UNIQUE(list_id, name)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("item_memory table: {e}")))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_items_list_id ON items(list_id)")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::MigrationFailed(format!("list_id index: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    fn row_to_list(row: &sqlx::sqlite::SqliteRow) -> Result<List, StoreError> {
        let id: i64 = row
            .try_get("id")
            .map_err(|e| StoreError::QueryFailed(format!("id column: {e}")))?;
        let name: String = row
            .try_get("name")
            .map_err(|e| StoreError::QueryFailed(format!("name column: {e}")))?;
        Ok(List { id, name })
    }

    fn row_to_item(row: &sqlx::sqlite::SqliteRow) -> Result<Item, StoreError> {
        let id: i64 = row
            .try_get("id")
            .map_err(|e| StoreError::QueryFailed(format!("id column: {e}")))?;
        // NULL only for legacy rows not yet adopted by a list
        let list_id: Option<i64> = row
            .try_get("list_id")
            .map_err(|e| StoreError::QueryFailed(format!("list_id column: {e}")))?;
        let name: String = row
            .try_get("name")
            .map_err(|e| StoreError::QueryFailed(format!("name column: {e}")))?;
        let completed: bool = row
            .try_get("completed")
            .map_err(|e| StoreError::QueryFailed(format!("completed column: {e}")))?;

        Ok(Item {
            id,
            list_id: list_id.unwrap_or_default(),
            name,
            completed,
        })
    }
}

#[async_trait]
impl ListRepository for SqliteStore {
    async fn list_all(&self) -> shoplist_core::Result<Vec<List>> {
        let rows = sqlx::query("SELECT id, name FROM lists ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(query_failed("list lists"))?;

        Ok(rows
            .iter()
            .map(Self::row_to_list)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn get_list(&self, id: i64) -> shoplist_core::Result<Option<List>> {
        let row = sqlx::query("SELECT id, name FROM lists WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_failed("get list"))?;

        Ok(row.as_ref().map(Self::row_to_list).transpose()?)
    }

    async fn create_list(&self, name: &str) -> shoplist_core::Result<List> {
        let name = normalize_name(name).ok_or(ValidationError::EmptyName)?;

        let result = sqlx::query("INSERT INTO lists (name) VALUES (?1)")
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(query_failed("insert list"))?;

        let list = List {
            id: result.last_insert_rowid(),
            name: name.to_string(),
        };
        debug!(list_id = list.id, "Created list");
        Ok(list)
    }

    async fn rename_list(&self, id: i64, name: &str) -> shoplist_core::Result<()> {
        let Some(name) = normalize_name(name) else {
            return Ok(());
        };

        sqlx::query("UPDATE lists SET name = ?1 WHERE id = ?2")
            .bind(name)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(query_failed("rename list"))?;
        Ok(())
    }

    async fn delete_list(&self, id: i64) -> shoplist_core::Result<()> {
        // Dropping `tx` without commit rolls the cascade back.
        let mut tx = self.pool.begin().await.map_err(query_failed("begin"))?;

        let items = sqlx::query("DELETE FROM items WHERE list_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(query_failed("cascade items"))?
            .rows_affected();

        sqlx::query("DELETE FROM item_memory WHERE list_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(query_failed("cascade memory"))?;

        let deleted = sqlx::query(
            "DELETE FROM lists WHERE id = ?1 AND (SELECT COUNT(*) FROM lists) > 1",
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(query_failed("delete list"))?
        .rows_affected();

        if deleted == 0 {
            let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM lists WHERE id = ?1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(query_failed("probe list"))?;

            return match exists {
                Some(_) => Err(InvariantViolation::LastListProtected.into()),
                None => Ok(()),
            };
        }

        tx.commit().await.map_err(query_failed("commit"))?;
        debug!(list_id = id, items, "Deleted list");
        Ok(())
    }

    async fn ensure_default(&self, name: &str) -> shoplist_core::Result<Option<List>> {
        let name = normalize_name(name).ok_or(ValidationError::EmptyName)?;
        let mut tx = self.pool.begin().await.map_err(query_failed("begin"))?;

        let result =
            sqlx::query("INSERT INTO lists (name) SELECT ?1 WHERE NOT EXISTS (SELECT 1 FROM lists)")
                .bind(name)
                .execute(&mut *tx)
                .await
                .map_err(query_failed("insert default list"))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        let id = result.last_insert_rowid();
        let adopted = sqlx::query(
            "UPDATE items SET list_id = ?1 WHERE list_id IS NULL OR list_id NOT IN (SELECT id FROM lists)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(query_failed("adopt orphaned items"))?
        .rows_affected();

        tx.commit().await.map_err(query_failed("commit"))?;
        info!(list_id = id, adopted, "Created default list");

        Ok(Some(List {
            id,
            name: name.to_string(),
        }))
    }
}

#[async_trait]
impl ItemRepository for SqliteStore {
    async fn items_for(&self, list_id: i64) -> Result<Vec<Item>, StoreError> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE list_id = ?1 ORDER BY completed ASC, id DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(list_id)
            .fetch_all(&self.pool)
            .await
            .map_err(query_failed("list items"))?;

        rows.iter().map(Self::row_to_item).collect()
    }

    async fn get_item(&self, id: i64) -> Result<Option<Item>, StoreError> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_failed("get item"))?;

        row.as_ref().map(Self::row_to_item).transpose()
    }

    async fn add_item(&self, list_id: i64, name: &str) -> Result<Option<Item>, StoreError> {
        let Some(name) = normalize_name(name) else {
            return Ok(None);
        };
        let mut tx = self.pool.begin().await.map_err(query_failed("begin"))?;

        let result = sqlx::query(
            r#"
            INSERT INTO items (list_id, name, completed)
            SELECT ?1, ?2, 0 WHERE EXISTS (SELECT 1 FROM lists WHERE id = ?1)
            "#,
        )
        .bind(list_id)
        .bind(name)
        .execute(&mut *tx)
        .await
        .map_err(query_failed("insert item"))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        let id = result.last_insert_rowid();

        sqlx::query("DELETE FROM item_memory WHERE list_id = ?1 AND name = ?2")
            .bind(list_id)
            .bind(name)
            .execute(&mut *tx)
            .await
            .map_err(query_failed("clear suggestion"))?;

        tx.commit().await.map_err(query_failed("commit"))?;
        debug!(item_id = id, list_id, "Added item");

        Ok(Some(Item {
            id,
            list_id,
            name: name.to_string(),
            completed: false,
        }))
    }

    async fn rename_item(&self, id: i64, name: &str) -> Result<Option<Item>, StoreError> {
        let Some(name) = normalize_name(name) else {
            return self.get_item(id).await;
        };

        let sql = format!("UPDATE items SET name = ?1 WHERE id = ?2 RETURNING {ITEM_COLUMNS}");
        let row = sqlx::query(&sql)
            .bind(name)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_failed("rename item"))?;

        row.as_ref().map(Self::row_to_item).transpose()
    }

    async fn toggle_completed(&self, id: i64) -> Result<Option<Item>, StoreError> {
        let sql = format!(
            "UPDATE items SET completed = NOT completed WHERE id = ?1 RETURNING {ITEM_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_failed("toggle item"))?;

        row.as_ref().map(Self::row_to_item).transpose()
    }

    async fn delete_item(&self, id: i64) -> Result<Option<Item>, StoreError> {
        let mut tx = self.pool.begin().await.map_err(query_failed("begin"))?;

        let sql = format!("DELETE FROM items WHERE id = ?1 RETURNING {ITEM_COLUMNS}");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(query_failed("delete item"))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let item = Self::row_to_item(&row)?;

        sqlx::query(
            r#"
            INSERT OR IGNORE INTO item_memory (list_id, name)
            SELECT ?1, ?2 WHERE EXISTS (SELECT 1 FROM lists WHERE id = ?1)
            "#,
        )
        .bind(item.list_id)
        .bind(&item.name)
        .execute(&mut *tx)
        .await
        .map_err(query_failed("remember item"))?;

        tx.commit().await.map_err(query_failed("commit"))?;
        debug!(item_id = id, list_id = item.list_id, "Deleted item");
        Ok(Some(item))
    }
}

#[async_trait]
impl MemoryRepository for SqliteStore {
    async fn suggestions(&self, list_id: i64) -> Result<Vec<String>, StoreError> {
        sqlx::query_scalar("SELECT DISTINCT name FROM item_memory WHERE list_id = ?1 ORDER BY name")
            .bind(list_id)
            .fetch_all(&self.pool)
            .await
            .map_err(query_failed("list suggestions"))
    }

    async fn forget_item_name(&self, item_id: i64) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            DELETE FROM item_memory
            WHERE EXISTS (
                SELECT 1 FROM items i
                WHERE i.id = ?1 AND i.list_id = item_memory.list_id AND i.name = item_memory.name
            )
            "#,
        )
        .bind(item_id)
        .execute(&self.pool)
        .await
        .map_err(query_failed("forget item name"))?;
        Ok(())
    }

    async fn forget(&self, list_id: i64, name: &str) -> Result<(), StoreError> {
        let Some(name) = normalize_name(name) else {
            return Ok(());
        };

        sqlx::query("DELETE FROM item_memory WHERE list_id = ?1 AND name = ?2")
            .bind(list_id)
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(query_failed("forget suggestion"))?;
        Ok(())
    }
}

impl Store for SqliteStore {
    fn backend_name(&self) -> &str {
        "sqlite"
    }
}
