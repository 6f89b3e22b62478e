//! SQL session abstraction and its PostgreSQL implementation

use std::io::{self, Error, ErrorKind};

use tokio_postgres::{Client, NoTls, SimpleQueryMessage};

use crate::core::config::ConnectionSettings;

/// A single database session that statements are sent to in order
#[allow(async_fn_in_trait)]
pub trait SqlSession {
    /// Run a benchmarked statement and receive its full result set
    async fn execute(&mut self, sql: &str) -> io::Result<()>;

    /// Run a session setup statement (`load`, `set ...`)
    async fn configure(&mut self, sql: &str) -> io::Result<()>;
}

pub struct PgSession {
    client: Client,
}

impl PgSession {
    pub async fn connect(settings: &ConnectionSettings) -> io::Result<Self> {
        let mut config = tokio_postgres::Config::new();
        config
            .host(&settings.host)
            .port(settings.port)
            .user(&settings.user)
            .dbname(&settings.database);
        if !settings.password.is_empty() {
            config.password(&settings.password);
        }

        let (client, connection) = config.connect(NoTls).await.map_err(|e| {
            Error::new(
                ErrorKind::ConnectionRefused,
                format!(
                    "Failed to connect to {}@{}:{}/{}: {}",
                    settings.user, settings.host, settings.port, settings.database, e
                ),
            )
        })?;

        // The connection future drives the socket; the client only queues requests.
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                eprintln!("❌ Database connection error: {}", e);
            }
        });

        Ok(Self { client })
    }

    pub async fn server_version(&self) -> io::Result<String> {
        let messages = self
            .client
            .simple_query("select version()")
            .await
            .map_err(|e| statement_error("select version()", e))?;
        for message in messages {
            if let SimpleQueryMessage::Row(row) = message {
                if let Some(version) = row.get(0) {
                    return Ok(version.to_string());
                }
            }
        }
        Err(Error::new(ErrorKind::InvalidData, "select version() returned no rows"))
    }
}

impl SqlSession for PgSession {
    async fn execute(&mut self, sql: &str) -> io::Result<()> {
        self.client
            .simple_query(sql)
            .await
            .map(|_| ())
            .map_err(|e| statement_error(sql, e))
    }

    async fn configure(&mut self, sql: &str) -> io::Result<()> {
        self.client
            .batch_execute(sql)
            .await
            .map_err(|e| statement_error(sql, e))
    }
}

fn statement_error(sql: &str, e: tokio_postgres::Error) -> Error {
    let detail = match e.as_db_error() {
        Some(db) => format!("{} ({})", db.message(), db.code().code()),
        None => e.to_string(),
    };
    Error::new(ErrorKind::Other, format!("Statement failed: {}\n   SQL: {}", detail, sql))
}
