use std::env;
use std::str::FromStr;
use tracing::warn;

/// Which persistence backend the API serves patients from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Supabase,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "supabase" | "postgrest" => Ok(StoreBackend::Supabase),
            other => Err(format!("Unknown patient store backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub store_backend: StoreBackend,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_key: String,
    /// `None` allows any origin.
    pub cors_allow_origin: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            store_backend: StoreBackend::Memory,
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            supabase_service_key: String::new(),
            cors_allow_origin: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port = match env::var("PORT") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                warn!("PORT '{}' is not a valid port, using {}", raw, defaults.port);
                defaults.port
            }),
            Err(_) => defaults.port,
        };

        let store_backend = match env::var("PATIENT_STORE") {
            Ok(raw) => raw.parse().unwrap_or_else(|e| {
                warn!("{}, using in-memory store", e);
                StoreBackend::Memory
            }),
            Err(_) => defaults.store_backend,
        };

        let config = Self {
            port,
            store_backend,
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_service_key: env::var("SUPABASE_SERVICE_KEY").unwrap_or_default(),
            cors_allow_origin: env::var("CORS_ALLOW_ORIGIN").ok().filter(|o| !o.is_empty()),
        };

        if config.store_backend == StoreBackend::Supabase && !config.is_supabase_configured() {
            warn!("Supabase store selected but SUPABASE_URL / SUPABASE_ANON_PUBLIC_KEY are missing");
        }

        config
    }

    pub fn is_supabase_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_anon_key.is_empty()
    }

    /// Bearer token sent to PostgREST: the service key when set, else the anon key.
    pub fn supabase_token(&self) -> &str {
        if self.supabase_service_key.is_empty() {
            &self.supabase_anon_key
        } else {
            &self.supabase_service_key
        }
    }
}
