use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub evolution: EvolutionSettings,
    #[serde(default)]
    pub meta: MetaSettings,
    #[serde(default)]
    pub delivery: DeliverySettings,
    #[serde(default)]
    pub security: SecuritySettings,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// `development` ou `production`
    pub environment: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            environment: "development".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Sem URL o gateway roda com o store em memória
    pub url: Option<String>,
    pub max_connections: u32,
    pub run_migrations: bool,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            run_migrations: true,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct EvolutionSettings {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    /// Quando definido, webhooks precisam trazer este valor em `apikey`
    pub webhook_token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct MetaSettings {
    pub graph_url: String,
    pub graph_version: String,
    pub app_secret: Option<String>,
    pub verify_token: Option<String>,
}

impl Default for MetaSettings {
    fn default() -> Self {
        Self {
            graph_url: meta_graph::DEFAULT_GRAPH_BASE_URL.to_string(),
            graph_version: meta_graph::DEFAULT_GRAPH_VERSION.to_string(),
            app_secret: None,
            verify_token: None,
        }
    }
}

/// Política de retry dos envios aos provedores
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct DeliverySettings {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for DeliverySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 100,
            max_backoff_ms: 2_000,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct SecuritySettings {
    /// Chave exigida em `X-Api-Key` nas rotas de envio
    pub api_key: Option<String>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let mut builder = Config::builder()
            // Arquivo de configuração base
            .add_source(File::with_name("config/default").required(false))
            // Arquivo específico do ambiente
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .set_default("server.environment", run_mode.as_str())?;

        // Variáveis conhecidas (docker-compose / Cloud Run)
        let overrides = [
            ("DATABASE_URL", "database.url"),
            ("EVOLUTION_API_URL", "evolution.api_url"),
            ("EVOLUTION_API_KEY", "evolution.api_key"),
            ("EVOLUTION_WEBHOOK_TOKEN", "evolution.webhook_token"),
            ("META_APP_SECRET", "meta.app_secret"),
            ("META_VERIFY_TOKEN", "meta.verify_token"),
            ("API_KEY", "security.api_key"),
            ("RUST_ENV", "server.environment"),
        ];
        for (var, key) in overrides {
            if let Ok(value) = std::env::var(var) {
                if !value.trim().is_empty() {
                    builder = builder.set_override(key, value)?;
                }
            }
        }

        // OMNICHAT__SERVER__PORT=9000
        builder = builder.add_source(
            Environment::with_prefix("OMNICHAT")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        // No Cloud Run a porta vem em PORT
        if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            builder = builder.set_override("server.port", i64::from(port))?;
        }

        builder.build()?.try_deserialize()
    }

    pub fn is_production(&self) -> bool {
        self.server.environment.eq_ignore_ascii_case("production")
    }

    pub fn evolution_configured(&self) -> bool {
        matches!(
            (&self.evolution.api_url, &self.evolution.api_key),
            (Some(url), Some(key)) if !url.is_empty() && !key.is_empty()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.delivery.max_attempts, 3);
        assert_eq!(settings.meta.graph_version, "v18.0");
        assert!(!settings.is_production());
        assert!(!settings.evolution_configured());
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let settings: Settings = Config::builder()
            .add_source(config::File::from_str(
                "[server]\nhost = \"127.0.0.1\"\nport = 3000\nenvironment = \"production\"\n\n[evolution]\napi_url = \"http://evo:8080\"\napi_key = \"k\"\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.server.port, 3000);
        assert!(settings.is_production());
        assert!(settings.evolution_configured());
        assert_eq!(settings.delivery.initial_backoff_ms, 100);
        assert!(settings.database.url.is_none());
    }
}
