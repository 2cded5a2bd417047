use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use schools_data::{sqlite, Backend, PgSettings};

const DEFAULT_PORT: u16 = 3000;

/// Server configuration loaded from file and/or environment.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Active environment profile (`prod` or `dev`).
    pub env: String,
    pub host: IpAddr,
    pub port: u16,
    pub database: DatabaseConfig,
}

/// Which store to open at startup, with everything needed to open it.
#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseConfig {
    Sqlite { path: PathBuf },
    Postgres(PgSettings),
    Memory,
}

impl DatabaseConfig {
    pub fn backend(&self) -> Backend {
        match self {
            DatabaseConfig::Sqlite { .. } => Backend::Sqlite,
            DatabaseConfig::Postgres(_) => Backend::Postgres,
            DatabaseConfig::Memory => Backend::Memory,
        }
    }
}

fn parse_backend(raw: &str) -> Result<Backend> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "sqlite" => Ok(Backend::Sqlite),
        "postgres" | "postgresql" | "pg" => Ok(Backend::Postgres),
        "memory" | "in-memory" => Ok(Backend::Memory),
        other => bail!(
            "Invalid database backend '{}'. Expected 'sqlite', 'postgres' or 'memory'.",
            other
        ),
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
struct ProfileConfig {
    host: Option<String>,
    port: Option<u16>,
    backend: Option<String>,
    sqlite_path: Option<PathBuf>,
    database_url: Option<String>,
    db_ssl: Option<bool>,
}

impl ProfileConfig {
    /// Fill unset fields from `fallback`.
    fn or(self, fallback: &ProfileConfig) -> ProfileConfig {
        ProfileConfig {
            host: self.host.or_else(|| fallback.host.clone()),
            port: self.port.or(fallback.port),
            backend: self.backend.or_else(|| fallback.backend.clone()),
            sqlite_path: self.sqlite_path.or_else(|| fallback.sqlite_path.clone()),
            database_url: self.database_url.or_else(|| fallback.database_url.clone()),
            db_ssl: self.db_ssl.or(fallback.db_ssl),
        }
    }
}

/// Raw TOML file structure for `~/.config/schools/config.toml`.
#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    #[serde(flatten)]
    base: ProfileConfig,
    active_env: Option<String>,
    prod: Option<ProfileConfig>,
    dev: Option<ProfileConfig>,
}

/// Values taken from process environment variables.
#[derive(Debug, Default, Clone)]
struct EnvVars {
    env: Option<String>,
    node_env: Option<String>,
    host: Option<String>,
    port: Option<String>,
    backend: Option<String>,
    use_pg: bool,
    sqlite_path: Option<PathBuf>,
    database_url: Option<String>,
    db_ssl: Option<bool>,
}

impl EnvVars {
    fn from_process() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            env: var("SCHOOLS_ENV"),
            node_env: var("NODE_ENV"),
            host: var("SCHOOLS_HOST"),
            port: var("PORT"),
            backend: var("SCHOOLS_DB_BACKEND"),
            use_pg: var("USE_PG").as_deref() == Some("true"),
            sqlite_path: var("SCHOOLS_SQLITE_PATH").map(PathBuf::from),
            database_url: var("DATABASE_URL"),
            db_ssl: var("DB_SSL_ENABLED").map(|v| v == "true"),
        }
    }

    fn as_profile(&self) -> Result<ProfileConfig> {
        let port = match &self.port {
            Some(raw) => Some(
                raw.parse::<u16>()
                    .with_context(|| format!("invalid PORT value '{}'", raw))?,
            ),
            None => None,
        };
        let backend = self
            .backend
            .clone()
            .or_else(|| self.use_pg.then(|| "postgres".to_string()));
        Ok(ProfileConfig {
            host: self.host.clone(),
            port,
            backend,
            sqlite_path: self.sqlite_path.clone(),
            database_url: self.database_url.clone(),
            db_ssl: self.db_ssl,
        })
    }
}

/// Default config file location.
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("schools").join("config.toml"))
}

impl ServerConfig {
    /// Load configuration from file and environment variables.
    ///
    /// Priority: environment variables override profile values, which
    /// override flat file values. File path can be overridden by
    /// `config_path`, the environment profile by `env_override`.
    pub fn load(config_path: Option<&PathBuf>, env_override: Option<&str>) -> Result<Self> {
        let path = config_path.cloned().or_else(default_config_path);

        let file_config = match path {
            Some(path) if path.exists() => {
                let content = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read config: {}", path.display()))?;
                toml::from_str::<ConfigFile>(&content)
                    .with_context(|| format!("failed to parse config: {}", path.display()))?
            }
            _ => ConfigFile::default(),
        };

        Self::from_file_and_env(file_config, &EnvVars::from_process(), env_override)
    }

    /// Build config from parsed file values and captured environment.
    fn from_file_and_env(
        file_config: ConfigFile,
        vars: &EnvVars,
        env_override: Option<&str>,
    ) -> Result<Self> {
        let ConfigFile {
            base,
            active_env,
            prod,
            dev,
        } = file_config;

        let env = resolve_env(
            env_override,
            vars.env.as_deref(),
            vars.node_env.as_deref(),
            active_env.as_deref(),
        )?;
        let profile = match env.as_str() {
            "dev" => dev,
            "prod" => prod,
            _ => None,
        }
        .unwrap_or_default();

        let merged = vars.as_profile()?.or(&profile.or(&base));
        Self::build(env, merged)
    }

    /// Build config from resolved option values (after file + env merging).
    fn build(env: String, values: ProfileConfig) -> Result<Self> {
        let host = match values.host.as_deref() {
            Some(raw) => IpAddr::from_str(raw.trim())
                .with_context(|| format!("invalid host address '{}'", raw))?,
            None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };
        let port = values.port.unwrap_or(DEFAULT_PORT);

        let backend = match values.backend.as_deref() {
            Some(raw) => parse_backend(raw)?,
            None if env == "prod" => Backend::Postgres,
            None => Backend::Sqlite,
        };

        let database = match backend {
            Backend::Sqlite => {
                let path = match values.sqlite_path {
                    Some(path) => path,
                    None => match sqlite::default_db_path() {
                        Some(path) => path,
                        None => bail!(
                            "could not determine data directory; set sqlite_path in config file or SCHOOLS_SQLITE_PATH env var"
                        ),
                    },
                };
                DatabaseConfig::Sqlite { path }
            }
            Backend::Postgres => {
                let url = match values.database_url {
                    Some(url) if !url.is_empty() => url,
                    _ => bail!(
                        "database_url is required for the postgres backend (set in config file or DATABASE_URL env var)"
                    ),
                };
                DatabaseConfig::Postgres(PgSettings::new(url, values.db_ssl.unwrap_or(false)))
            }
            Backend::Memory => DatabaseConfig::Memory,
        };

        Ok(Self {
            env,
            host,
            port,
            database,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn resolve_env(
    env_override: Option<&str>,
    schools_env: Option<&str>,
    node_env: Option<&str>,
    active_env: Option<&str>,
) -> Result<String> {
    // NODE_ENV is shared with other tooling; only its two well-known values count.
    let node_env = node_env.filter(|v| matches!(*v, "production" | "development"));

    let raw = env_override
        .or(schools_env)
        .or(node_env)
        .or(active_env)
        .unwrap_or("dev");

    match raw.trim().to_ascii_lowercase().as_str() {
        "prod" | "production" => Ok("prod".to_string()),
        "dev" | "development" => Ok("dev".to_string()),
        other => bail!(
            "Invalid environment '{}'. Expected 'prod' or 'dev'.",
            other
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Tests go through from_file_and_env/build to avoid env var mutation.

    fn values() -> ProfileConfig {
        ProfileConfig::default()
    }

    #[test]
    fn test_build_dev_defaults_to_sqlite() {
        let config = ServerConfig::build(
            "dev".to_string(),
            ProfileConfig {
                sqlite_path: Some(PathBuf::from("/tmp/schools.db")),
                ..values()
            },
        )
        .unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.host, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(
            config.database,
            DatabaseConfig::Sqlite {
                path: PathBuf::from("/tmp/schools.db")
            }
        );
    }

    #[test]
    fn test_build_prod_defaults_to_postgres() {
        let config = ServerConfig::build(
            "prod".to_string(),
            ProfileConfig {
                database_url: Some("postgres://localhost/schools".to_string()),
                db_ssl: Some(true),
                ..values()
            },
        )
        .unwrap();

        assert_eq!(config.database.backend(), Backend::Postgres);
        match config.database {
            DatabaseConfig::Postgres(settings) => {
                assert_eq!(settings.url, "postgres://localhost/schools");
                assert!(settings.ssl);
            }
            other => panic!("unexpected database config: {:?}", other),
        }
    }

    #[test]
    fn test_build_postgres_without_url_errors() {
        let result = ServerConfig::build("prod".to_string(), values());
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("database_url"));
    }

    #[test]
    fn test_build_empty_url_errors() {
        let result = ServerConfig::build(
            "dev".to_string(),
            ProfileConfig {
                backend: Some("postgres".to_string()),
                database_url: Some(String::new()),
                ..values()
            },
        );
        assert!(result.unwrap_err().to_string().contains("database_url"));
    }

    #[test]
    fn test_build_memory_backend() {
        let config = ServerConfig::build(
            "prod".to_string(),
            ProfileConfig {
                backend: Some("memory".to_string()),
                ..values()
            },
        )
        .unwrap();
        assert_eq!(config.database, DatabaseConfig::Memory);
    }

    #[test]
    fn test_build_invalid_backend_errors() {
        let result = ServerConfig::build(
            "dev".to_string(),
            ProfileConfig {
                backend: Some("mongo".to_string()),
                ..values()
            },
        );
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Invalid database backend"));
    }

    #[test]
    fn test_build_invalid_host_errors() {
        let result = ServerConfig::build(
            "dev".to_string(),
            ProfileConfig {
                host: Some("not-an-ip".to_string()),
                backend: Some("memory".to_string()),
                ..values()
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_socket_addr() {
        let config = ServerConfig::build(
            "dev".to_string(),
            ProfileConfig {
                host: Some("127.0.0.1".to_string()),
                port: Some(8080),
                backend: Some("memory".to_string()),
                ..values()
            },
        )
        .unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8080");
    }

    #[test]
    fn test_config_file_parsing_profiles() {
        let toml_str = r#"
active_env = "prod"
port = 4000

[prod]
backend = "postgres"
database_url = "postgres://prod/schools"
db_ssl = true

[dev]
sqlite_path = "/tmp/dev.db"
"#;
        let file_config: ConfigFile = toml::from_str(toml_str).unwrap();
        assert_eq!(file_config.active_env.as_deref(), Some("prod"));
        assert_eq!(file_config.base.port, Some(4000));
        assert_eq!(
            file_config
                .prod
                .as_ref()
                .and_then(|p| p.database_url.as_deref()),
            Some("postgres://prod/schools")
        );
        assert_eq!(
            file_config
                .dev
                .as_ref()
                .and_then(|p| p.sqlite_path.clone()),
            Some(PathBuf::from("/tmp/dev.db"))
        );
    }

    #[test]
    fn test_from_file_and_env_uses_profile_over_base() {
        let file = ConfigFile {
            base: ProfileConfig {
                port: Some(4000),
                backend: Some("memory".to_string()),
                ..values()
            },
            active_env: Some("dev".to_string()),
            dev: Some(ProfileConfig {
                backend: Some("sqlite".to_string()),
                sqlite_path: Some(PathBuf::from("/tmp/dev.db")),
                ..values()
            }),
            prod: None,
        };

        let config = ServerConfig::from_file_and_env(file, &EnvVars::default(), None).unwrap();
        assert_eq!(config.env, "dev");
        assert_eq!(config.port, 4000);
        assert_eq!(config.database.backend(), Backend::Sqlite);
    }

    #[test]
    fn test_env_vars_override_file() {
        let file = ConfigFile {
            base: ProfileConfig {
                port: Some(4000),
                sqlite_path: Some(PathBuf::from("/tmp/file.db")),
                ..values()
            },
            ..ConfigFile::default()
        };
        let vars = EnvVars {
            port: Some("5000".to_string()),
            use_pg: true,
            database_url: Some("postgres://env/schools".to_string()),
            db_ssl: Some(true),
            ..EnvVars::default()
        };

        let config = ServerConfig::from_file_and_env(file, &vars, None).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(
            config.database,
            DatabaseConfig::Postgres(PgSettings::new("postgres://env/schools", true))
        );
    }

    #[test]
    fn test_explicit_backend_beats_use_pg() {
        let vars = EnvVars {
            backend: Some("memory".to_string()),
            use_pg: true,
            ..EnvVars::default()
        };
        let config =
            ServerConfig::from_file_and_env(ConfigFile::default(), &vars, None).unwrap();
        assert_eq!(config.database, DatabaseConfig::Memory);
    }

    #[test]
    fn test_invalid_port_env_errors() {
        let vars = EnvVars {
            port: Some("eighty".to_string()),
            ..EnvVars::default()
        };
        let err = ServerConfig::from_file_and_env(ConfigFile::default(), &vars, None).unwrap_err();
        assert!(err.to_string().contains("invalid PORT"));
    }

    #[test]
    fn test_resolve_env_defaults_dev() {
        assert_eq!(resolve_env(None, None, None, None).unwrap(), "dev");
    }

    #[test]
    fn test_resolve_env_priority() {
        assert_eq!(
            resolve_env(Some("dev"), Some("prod"), None, None).unwrap(),
            "dev"
        );
        assert_eq!(
            resolve_env(None, Some("prod"), Some("development"), None).unwrap(),
            "prod"
        );
        assert_eq!(
            resolve_env(None, None, Some("production"), Some("dev")).unwrap(),
            "prod"
        );
        assert_eq!(resolve_env(None, None, None, Some("prod")).unwrap(), "prod");
    }

    #[test]
    fn test_resolve_env_ignores_unknown_node_env() {
        assert_eq!(resolve_env(None, None, Some("test"), None).unwrap(), "dev");
    }

    #[test]
    fn test_resolve_env_rejects_invalid_value() {
        let err = resolve_env(Some("staging"), None, None, None).unwrap_err();
        assert!(err.to_string().contains("Invalid environment"));
    }

    #[test]
    fn test_load_from_file() {
        use std::fs;
        use tempfile::TempDir;

        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(
            &config_path,
            r#"
host = "127.0.0.1"
port = 3999
backend = "memory"
"#,
        )
        .unwrap();

        let config = ServerConfig::load(Some(&config_path), Some("dev")).unwrap();
        assert_eq!(config.env, "dev");
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3999");
    }
}
