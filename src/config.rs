use serde::{Deserialize, Serialize};

use crate::logic::mapper::DEFAULT_DATE_FORMAT;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub crops: CropConfig,
    pub ontology: OntologyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Crops this installation serves; requests naming any other crop are rejected
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CropConfig {
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OntologyConfig {
    /// chrono format string for `dateCreated`/`lastModified`
    pub date_format: String,
    /// Populate the in-memory middleware with the sample maize ontology
    pub load_seed_data: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
        }
    }
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            names: vec!["maize".to_string(), "wheat".to_string(), "rice".to_string()],
        }
    }
}

impl Default for OntologyConfig {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            load_seed_data: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, an optional `config` file and
    /// `BMSAPI__`-prefixed environment variables (e.g. `BMSAPI__SERVER__PORT`,
    /// `BMSAPI__CROPS__NAMES=maize,wheat`)
    pub fn load() -> anyhow::Result<Self> {
        let mut config = config::Config::builder();

        config = config.add_source(config::Config::try_from(&AppConfig::default())?);

        config = config.add_source(config::File::with_name("config").required(false));

        config = config.add_source(
            config::Environment::with_prefix("BMSAPI")
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("crops.names")
                .try_parsing(true),
        );

        let config = config.build()?;
        let app_config: AppConfig = config.try_deserialize()?;

        Ok(app_config)
    }

    /// Get the server bind address
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server_address(), "127.0.0.1:3001");
        assert!(config.crops.names.contains(&"maize".to_string()));
        assert!(!config.ontology.load_seed_data);
        assert_eq!(config.ontology.date_format, DEFAULT_DATE_FORMAT);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let built = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default()).unwrap())
            .add_source(config::File::from_str(
                "[server]\nport = 8080\n[crops]\nnames = [\"cassava\"]\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();
        let config: AppConfig = built.try_deserialize().unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.crops.names, vec!["cassava".to_string()]);
    }
}
