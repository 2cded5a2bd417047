//! PostgreSQL-backed store.

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgRow, PgSslMode};
use sqlx::Row;
use tracing::{debug, info};

use schools_core::{NewSchool, School};

use crate::{Backend, SchoolStore};

const CREATE_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS schools (
        id          BIGSERIAL PRIMARY KEY,
        name        VARCHAR(255) NOT NULL,
        address     VARCHAR(255) NOT NULL,
        latitude    DOUBLE PRECISION NOT NULL,
        longitude   DOUBLE PRECISION NOT NULL,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
";

/// Columns read back from `schools`, normalized to the types [`from_row`] decodes.
///
/// Tables created by older deployments use `id SERIAL` (INT4) and
/// `created_at TIMESTAMP` without a time zone; `CREATE TABLE IF NOT EXISTS`
/// keeps those, so both columns are cast on every read.
const SCHOOL_COLUMNS: &str = "id::BIGINT AS id, name, address, latitude, longitude, \
     created_at::TIMESTAMPTZ AS created_at";

/// Connection settings for [`PgStore::connect`].
#[derive(Debug, Clone, PartialEq)]
pub struct PgSettings {
    pub url: String,
    /// Require TLS. The server certificate is not verified.
    pub ssl: bool,
    pub max_connections: u32,
    pub connect_timeout: Duration,
}

impl PgSettings {
    pub fn new(url: impl Into<String>, ssl: bool) -> Self {
        Self {
            url: url.into(),
            ssl,
            max_connections: 5,
            connect_timeout: Duration::from_secs(5),
        }
    }

    fn connect_options(&self) -> Result<PgConnectOptions> {
        let options =
            PgConnectOptions::from_str(&self.url).context("invalid PostgreSQL connection URL")?;
        Ok(if self.ssl {
            options.ssl_mode(PgSslMode::Require)
        } else {
            options
        })
    }
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect, then make sure the `schools` table exists.
    pub async fn connect(settings: &PgSettings) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.connect_timeout)
            .connect_with(settings.connect_options()?)
            .await
            .context("failed to connect to PostgreSQL")?;

        sqlx::query(CREATE_TABLE)
            .execute(&pool)
            .await
            .context("failed to create schools table")?;
        info!("PostgreSQL database ready");

        Ok(Self { pool })
    }
}

fn from_row(row: &PgRow) -> Result<School, sqlx::Error> {
    Ok(School {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        address: row.try_get("address")?,
        latitude: row.try_get("latitude")?,
        longitude: row.try_get("longitude")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl SchoolStore for PgStore {
    async fn fetch_all(&self) -> Result<Vec<School>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM schools ORDER BY id",
            SCHOOL_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .context("failed to list schools")?;

        let schools = rows
            .iter()
            .map(from_row)
            .collect::<Result<Vec<_>, _>>()
            .context("failed to decode school row")?;
        debug!(count = schools.len(), "fetched schools from PostgreSQL");
        Ok(schools)
    }

    async fn insert(&self, school: NewSchool) -> Result<School> {
        let sql = format!(
            "INSERT INTO schools (name, address, latitude, longitude)
             VALUES ($1, $2, $3, $4)
             RETURNING {}",
            SCHOOL_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(school.name())
            .bind(school.address())
            .bind(school.latitude())
            .bind(school.longitude())
            .fetch_one(&self.pool)
            .await
            .context("failed to insert school")?;

        from_row(&row).context("failed to decode inserted school")
    }

    fn backend(&self) -> Backend {
        Backend::Postgres
    }
}
