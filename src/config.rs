use crate::{errors::StatusPolicy, services::thumbnail_storage::ThumbnailStrategy};
use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use std::{env, fmt};

const ENV_PREFIX: &str = "THUMBNAIL_INTAKE_";

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub assets_root: String,
    /// Base URL clients use to reach this service; prefixes asset and API references.
    pub public_url: String,
    pub jwt_secret: String,
    pub thumbnail_strategy: ThumbnailStrategy,
    pub status_policy: StatusPolicy,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Video thumbnail upload service")]
pub struct Args {
    /// Host to bind to (overrides THUMBNAIL_INTAKE_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides THUMBNAIL_INTAKE_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Database URL (overrides THUMBNAIL_INTAKE_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Directory thumbnails are written to and served from (overrides THUMBNAIL_INTAKE_ASSETS_ROOT)
    #[arg(long)]
    pub assets_root: Option<String>,

    /// Public base URL of this service (overrides THUMBNAIL_INTAKE_PUBLIC_URL)
    #[arg(long)]
    pub public_url: Option<String>,

    /// Secret used to verify access tokens (overrides THUMBNAIL_INTAKE_JWT_SECRET)
    #[arg(long)]
    pub jwt_secret: Option<String>,

    /// Where uploaded thumbnails are kept (overrides THUMBNAIL_INTAKE_THUMBNAIL_STRATEGY)
    #[arg(long, value_enum)]
    pub thumbnail_strategy: Option<ThumbnailStrategy>,

    /// Status codes for upload failures (overrides THUMBNAIL_INTAKE_STATUS_CODES)
    #[arg(long, value_enum)]
    pub status_codes: Option<StatusPolicy>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        let args = Args::parse();
        let migrate = args.migrate;
        let cfg = Self::resolve(args, |key| env::var(format!("{ENV_PREFIX}{key}")).ok())?;
        Ok((cfg, migrate))
    }

    /// Merge `args` over values looked up by `env` (keys without the prefix),
    /// falling back to defaults. CLI wins over environment.
    pub fn resolve(args: Args, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = match args.port {
            Some(port) => port,
            None => match env("PORT") {
                Some(value) => value
                    .parse::<u16>()
                    .with_context(|| format!("parsing {ENV_PREFIX}PORT value `{}`", value))?,
                None => 8091,
            },
        };

        let thumbnail_strategy = match args.thumbnail_strategy {
            Some(strategy) => strategy,
            None => match env("THUMBNAIL_STRATEGY") {
                Some(value) => ThumbnailStrategy::from_str(&value, true).map_err(|err| {
                    anyhow!("parsing {ENV_PREFIX}THUMBNAIL_STRATEGY value `{value}`: {err}")
                })?,
                None => ThumbnailStrategy::default(),
            },
        };

        let status_policy = match args.status_codes {
            Some(policy) => policy,
            None => match env("STATUS_CODES") {
                Some(value) => StatusPolicy::from_str(&value, true).map_err(|err| {
                    anyhow!("parsing {ENV_PREFIX}STATUS_CODES value `{value}`: {err}")
                })?,
                None => StatusPolicy::default(),
            },
        };

        let jwt_secret = args
            .jwt_secret
            .or_else(|| env("JWT_SECRET"))
            .filter(|secret| !secret.is_empty())
            .with_context(|| format!("a JWT secret is required (--jwt-secret or {ENV_PREFIX}JWT_SECRET)"))?;

        let public_url = args
            .public_url
            .or_else(|| env("PUBLIC_URL"))
            .unwrap_or_else(|| format!("http://localhost:{}", port));

        Ok(Self {
            host: args
                .host
                .or_else(|| env("HOST"))
                .unwrap_or_else(|| "0.0.0.0".into()),
            port,
            database_url: args
                .database_url
                .or_else(|| env("DATABASE_URL"))
                .unwrap_or_else(|| "sqlite://./data/meta/thumbnails.db".into()),
            assets_root: args
                .assets_root
                .or_else(|| env("ASSETS_ROOT"))
                .unwrap_or_else(|| "./assets".into()),
            public_url: public_url.trim_end_matches('/').to_string(),
            jwt_secret,
            thumbnail_strategy,
            status_policy,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database_url", &self.database_url)
            .field("assets_root", &self.assets_root)
            .field("public_url", &self.public_url)
            .field("jwt_secret", &"<redacted>")
            .field("thumbnail_strategy", &self.thumbnail_strategy)
            .field("status_policy", &self.status_policy)
            .finish()
    }
}
