use anyhow::Context;

pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MAX_USERNAME_LENGTH: usize = 50;
pub const MIN_PASSWORD_LENGTH: usize = 1;
pub const MAX_BIO_LENGTH: usize = 500;
pub const MAX_DISPLAY_NAME_LENGTH: usize = 50;

const DEFAULT_BIND: &str = "0.0.0.0:8080";
const DEFAULT_AVATAR_SIZE: u32 = 100;

#[derive(Clone, Debug)]
pub struct Config {
    pub bind: String,
    pub jwt_secret: String,
    pub jwt_issuer: Option<String>,
    pub avatar_size: u32,
    pub seed_demo_data: bool,
}

impl Config {
    /// Reads `USERGRAPH_*` variables, loading a `.env` file first if present.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let jwt_secret = std::env::var("USERGRAPH_JWT_SECRET")
            .context("USERGRAPH_JWT_SECRET must be set")?;

        Ok(Config {
            bind: std::env::var("USERGRAPH_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string()),
            jwt_secret,
            jwt_issuer: std::env::var("USERGRAPH_JWT_ISSUER")
                .ok()
                .filter(|v| !v.is_empty()),
            avatar_size: parse_var("USERGRAPH_AVATAR_SIZE").unwrap_or(DEFAULT_AVATAR_SIZE),
            seed_demo_data: flag_var("USERGRAPH_SEED_DEMO_DATA"),
        })
    }

    /// Config suitable for tests and local tinkering.
    pub fn with_secret(secret: &str) -> Self {
        Config {
            bind: DEFAULT_BIND.to_string(),
            jwt_secret: secret.to_string(),
            jwt_issuer: None,
            avatar_size: DEFAULT_AVATAR_SIZE,
            seed_demo_data: false,
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

/// Unset means off. Unrecognized values are logged and treated as off.
fn flag_var(key: &str) -> bool {
    let Ok(raw) = std::env::var(key) else {
        return false;
    };
    parse_flag(&raw).unwrap_or_else(|| {
        tracing::warn!(key, value = %raw, "unrecognized boolean, treating as false");
        false
    })
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
