//! Storage backends for the schools service
//!
//! The web layer talks to a single [`SchoolStore`] trait object. Which
//! backend sits behind it (SQLite, PostgreSQL or the in-memory fallback)
//! is decided once at startup from configuration.

pub mod memory;
pub mod postgres;
pub mod sqlite;

use std::fmt;

use anyhow::Result;
use async_trait::async_trait;

use schools_core::{NewSchool, School};

pub use memory::MemoryStore;
pub use postgres::{PgSettings, PgStore};
pub use sqlite::SqliteStore;

/// Which engine a store is backed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Sqlite,
    Postgres,
    Memory,
}

impl Backend {
    /// Human-readable engine name, as reported by the health endpoint.
    pub fn label(&self) -> &'static str {
        match self {
            Backend::Sqlite => "SQLite",
            Backend::Postgres => "PostgreSQL",
            Backend::Memory => "in-memory",
        }
    }

    /// Whether this backend is a real database rather than the volatile list.
    pub fn is_database(&self) -> bool {
        !matches!(self, Backend::Memory)
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The storage collaborator: everything the service needs from a store.
#[async_trait]
pub trait SchoolStore: Send + Sync {
    /// All schools, in ascending id order.
    async fn fetch_all(&self) -> Result<Vec<School>>;

    /// Persist a validated school, returning it with `id` and `created_at` assigned.
    async fn insert(&self, school: NewSchool) -> Result<School>;

    fn backend(&self) -> Backend;
}
