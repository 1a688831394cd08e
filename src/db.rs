// db.rs
use sqlx::{Pool, Postgres};

pub mod chatdb;
pub mod memory;
pub mod messagedb;
pub mod userdb;

pub use chatdb::ChatExt;
pub use memory::MemoryStore;
pub use messagedb::MessageExt;
pub use userdb::UserExt;

/// Everything the handlers need from persistence. Implemented by the
/// PostgreSQL client and by the in-process memory store.
pub trait InboxStore: UserExt + ChatExt + MessageExt + Send + Sync + std::fmt::Debug {
    fn backend_name(&self) -> &'static str;
}

#[derive(Clone)]
pub struct DBClient {
    pub pool: Pool<Postgres>,
}

impl std::fmt::Debug for DBClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DBClient")
            .field("pool", &"Pool<Postgres>")
            .finish()
    }
}

impl DBClient {
    pub fn new(pool: Pool<Postgres>) -> Self {
        DBClient { pool }
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

impl InboxStore for DBClient {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

/// Unique-constraint failures from either backend.
pub fn is_unique_violation(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db_error) => db_error.is_unique_violation(),
        sqlx::Error::Protocol(message) => message.starts_with("duplicate"),
        _ => false,
    }
}
