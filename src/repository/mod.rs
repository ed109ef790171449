mod embedded;
mod memory;

use embedded::migrations;

pub use memory::MemoryRepository;

use tokio::sync::OnceCell;
use tokio_postgres::{Client, NoTls, Row};
use uuid::Uuid;

use crate::models::{Note, NoteDraft};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("migration error: {0}")]
    Migration(#[from] refinery::Error),
}

/// Note storage backend selected at start-up.
pub enum NoteStore {
    Postgres(Repository),
    Memory(MemoryRepository),
}

impl NoteStore {
    pub async fn create(&self, draft: &NoteDraft) -> Result<Note, StoreError> {
        match self {
            Self::Postgres(repo) => repo.create_note(draft).await,
            Self::Memory(repo) => Ok(repo.create_note(draft).await),
        }
    }

    pub async fn find_all(&self) -> Result<Vec<Note>, StoreError> {
        match self {
            Self::Postgres(repo) => repo.get_all_notes().await,
            Self::Memory(repo) => Ok(repo.get_all_notes().await),
        }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Note>, StoreError> {
        match self {
            Self::Postgres(repo) => repo.get_one_note(id).await,
            Self::Memory(repo) => Ok(repo.get_one_note(id).await),
        }
    }

    pub async fn update(&self, id: Uuid, draft: &NoteDraft) -> Result<Option<Note>, StoreError> {
        match self {
            Self::Postgres(repo) => repo.update_note(id, draft).await,
            Self::Memory(repo) => Ok(repo.update_note(id, draft).await),
        }
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        match self {
            Self::Postgres(repo) => repo.delete_note(id).await,
            Self::Memory(repo) => Ok(repo.delete_note(id).await),
        }
    }
}

/// PostgreSQL-backed note repository.
///
/// The connection is opened on first use and shared for the rest of the
/// process lifetime. Concurrent first callers wait on the same
/// initialisation instead of racing to connect.
pub struct Repository {
    database_dsn: String,
    client: OnceCell<Client>,
}

impl Repository {
    pub fn new(database_dsn: String) -> Self {
        Self {
            database_dsn,
            client: OnceCell::new(),
        }
    }

    async fn client(&self) -> Result<&Client, StoreError> {
        self.client
            .get_or_try_init(|| async {
                let (mut client, con) =
                    tokio_postgres::connect(&self.database_dsn, NoTls).await?;

                tokio::spawn(async move {
                    if let Err(e) = con.await {
                        tracing::error!("connection error: {}", e);
                    }
                });

                tracing::info!("Established database connection");
                migrate(&mut client).await?;

                Ok::<_, StoreError>(client)
            })
            .await
    }

    pub async fn create_note(&self, draft: &NoteDraft) -> Result<Note, StoreError> {
        let row = self
            .client()
            .await?
            .query_one(
                "INSERT INTO notes (title, content) VALUES ($1, $2) \
                 RETURNING id, title, content, created_at, updated_at",
                &[&draft.title(), &draft.content()],
            )
            .await?;

        Ok(note_from_row(&row))
    }

    pub async fn update_note(
        &self,
        id: Uuid,
        draft: &NoteDraft,
    ) -> Result<Option<Note>, StoreError> {
        let row = self
            .client()
            .await?
            .query_opt(
                "UPDATE notes SET title = $1, content = $2, \
                 updated_at = GREATEST(clock_timestamp(), updated_at + INTERVAL '1 microsecond') \
                 WHERE id = $3 RETURNING id, title, content, created_at, updated_at",
                &[&draft.title(), &draft.content(), &id],
            )
            .await?;

        Ok(row.as_ref().map(note_from_row))
    }

    pub async fn delete_note(&self, id: Uuid) -> Result<bool, StoreError> {
        let rows = self
            .client()
            .await?
            .execute("DELETE FROM notes WHERE id = $1", &[&id])
            .await?;

        Ok(rows == 1)
    }

    pub async fn get_one_note(&self, id: Uuid) -> Result<Option<Note>, StoreError> {
        let row = self
            .client()
            .await?
            .query_opt(
                "SELECT id, title, content, created_at, updated_at FROM notes WHERE id = $1",
                &[&id],
            )
            .await?;

        Ok(row.as_ref().map(note_from_row))
    }

    pub async fn get_all_notes(&self) -> Result<Vec<Note>, StoreError> {
        let rows = self
            .client()
            .await?
            .query(
                "SELECT id, title, content, created_at, updated_at FROM notes \
                 ORDER BY created_at DESC, id DESC",
                &[],
            )
            .await?;

        Ok(rows.iter().map(note_from_row).collect())
    }
}

async fn migrate(client: &mut Client) -> Result<(), StoreError> {
    let migrations_report = migrations::runner().run_async(client).await?;

    for migration in migrations_report.applied_migrations() {
        tracing::info!(
            "Migration Applied -  Name: {}, Version: {}",
            migration.name(),
            migration.version()
        );
    }

    tracing::info!("DB migrations finished!");

    Ok(())
}

fn note_from_row(row: &Row) -> Note {
    Note {
        id: row.get("id"),
        title: row.get("title"),
        content: row.get("content"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Nothing listens on port 1, so the first call fails while connecting.
    const UNREACHABLE_DSN: &str = "host=127.0.0.1 port=1 user=notes connect_timeout=2";

    #[tokio::test]
    async fn unreachable_database_surfaces_store_error() {
        let repo = Repository::new(UNREACHABLE_DSN.to_string());

        let err = repo.get_all_notes().await.unwrap_err();
        assert!(matches!(err, StoreError::Postgres(_)));

        // A failed initialisation leaves the cell empty so the next call retries.
        assert!(repo.client.get().is_none());
        assert!(repo.get_one_note(Uuid::new_v4()).await.is_err());
    }

    #[tokio::test]
    #[ignore = "requires a PostgreSQL database in PG_DSN"]
    async fn postgres_round_trip() {
        let dsn = std::env::var("PG_DSN").expect("PG_DSN must be set for this test");
        let repo = Repository::new(dsn);

        let draft = NoteDraft::parse(Some("Shopping"), Some("Milk, eggs")).unwrap();
        let created = repo.create_note(&draft).await.unwrap();
        assert_eq!(created.created_at, created.updated_at);

        let changed = NoteDraft::parse(Some("Shopping list"), Some("Milk, eggs, bread")).unwrap();
        let updated = repo.update_note(created.id, &changed).await.unwrap().unwrap();
        assert_eq!(updated.title, "Shopping list");
        assert!(updated.updated_at > created.updated_at);
        assert_eq!(updated.created_at, created.created_at);

        let listed = repo.get_all_notes().await.unwrap();
        assert!(listed.iter().any(|note| note.id == created.id));

        assert!(repo.delete_note(created.id).await.unwrap());
        assert!(repo.get_one_note(created.id).await.unwrap().is_none());
        assert!(!repo.delete_note(created.id).await.unwrap());
    }
}
