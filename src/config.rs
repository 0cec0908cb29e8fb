use std::fmt;
use std::path::PathBuf;

/// Settings loaded from the environment at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub mongo_uri: String,
    pub db_name: String,
    pub collections: CollectionNames,
    pub jwt_secret: String,
    pub static_dir: PathBuf,
    pub upload_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct CollectionNames {
    pub credentials: String,
    pub users: String,
    pub images: String,
}

#[derive(Debug, PartialEq)]
pub enum ConfigError {
    Missing(Vec<&'static str>),
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(keys) => {
                write!(f, "Missing required environment variables: {}", keys.join(", "))
            }
            ConfigError::Invalid { key, value } => {
                write!(f, "Invalid value for {}: {:?}", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

const REQUIRED: [&str; 9] = [
    "MONGO_URI",
    "DB_NAME",
    "CREDS_COLLECTION_NAME",
    "USERS_COLLECTION_NAME",
    "IMAGES_COLLECTION_NAME",
    "JWT_SECRET",
    "STATIC_DIR",
    "IMAGE_UPLOAD_DIR",
    "PORT",
];

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Every missing key is reported at once.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let missing: Vec<&'static str> = REQUIRED
            .iter()
            .copied()
            .filter(|key| get(key).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        let required = |key: &'static str| get(key).unwrap_or_default();

        let port_raw = required("PORT");
        let port = port_raw.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
            key: "PORT",
            value: port_raw.clone(),
        })?;

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            mongo_uri: required("MONGO_URI"),
            db_name: required("DB_NAME"),
            collections: CollectionNames {
                credentials: required("CREDS_COLLECTION_NAME"),
                users: required("USERS_COLLECTION_NAME"),
                images: required("IMAGES_COLLECTION_NAME"),
            },
            jwt_secret: required("JWT_SECRET"),
            static_dir: PathBuf::from(required("STATIC_DIR")),
            upload_dir: PathBuf::from(required("IMAGE_UPLOAD_DIR")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn full_env() -> HashMap<&'static str, String> {
        REQUIRED
            .iter()
            .map(|key| (*key, format!("value-of-{}", key.to_lowercase())))
            .chain([("PORT", "3000".to_string())])
            .collect()
    }

    #[test]
    fn test_loads_complete_environment() {
        let env = full_env();
        let config = AppConfig::from_lookup(|k| env.get(k).cloned()).unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.collections.images, "value-of-images_collection_name");
        assert_eq!(config.upload_dir, PathBuf::from("value-of-image_upload_dir"));
    }

    #[test]
    fn test_reports_every_missing_key() {
        let mut env = full_env();
        env.remove("JWT_SECRET");
        env.insert("DB_NAME", "   ".to_string());

        let err = AppConfig::from_lookup(|k| env.get(k).cloned()).unwrap_err();
        assert_eq!(err, ConfigError::Missing(vec!["DB_NAME", "JWT_SECRET"]));
    }

    #[test]
    fn test_rejects_bad_port() {
        let mut env = full_env();
        env.insert("PORT", "eighty".to_string());

        let err = AppConfig::from_lookup(|k| env.get(k).cloned()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PORT", .. }));
    }
}
