use anyhow::Context;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub max_connections: u32,
    /// Run the seed loader once migrations are applied.
    pub seed_on_startup: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key/value source. `DATABASE_URL` wins when present,
    /// otherwise the URL is assembled from the `DB_*` parts.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let database_url = match lookup("DATABASE_URL") {
            Some(url) => url,
            None => {
                let password = lookup("DB_PASSWORD").unwrap_or_default();
                let credentials = if password.is_empty() {
                    get("DB_USER", "postgres")
                } else {
                    format!("{}:{}", get("DB_USER", "postgres"), password)
                };
                format!(
                    "postgres://{}@{}:{}/{}",
                    credentials,
                    get("DB_HOST", "localhost"),
                    get("DB_PORT", "5432")
                        .parse::<u16>()
                        .context("DB_PORT must be a valid number")?,
                    get("DB_NAME", "catalog"),
                )
            }
        };

        Ok(Self {
            database_url,
            host: get("HOST", "0.0.0.0"),
            port: get("PORT", "8000")
                .parse()
                .context("PORT must be a valid number")?,
            max_connections: get("DB_MAX_CONNECTIONS", "10")
                .parse()
                .context("DB_MAX_CONNECTIONS must be a valid number")?,
            seed_on_startup: parse_flag(&get("SEED_ON_STARTUP", "false")),
        })
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
