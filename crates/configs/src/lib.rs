use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub supabase: SupabaseConfig,
    #[serde(default)]
    pub local: LocalConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub console: ConsoleConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
    #[serde(default = "default_assets_dir")]
    pub assets_dir: String,
    /// Mark the session cookie `Secure`; enable behind TLS.
    #[serde(default)]
    pub secure_cookies: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
            worker_threads: Some(4),
            assets_dir: default_assets_dir(),
            secure_cookies: false,
        }
    }
}

/// Which family of collaborators backs the console.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Supabase,
    Local,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct BackendConfig {
    #[serde(default)]
    pub kind: BackendKind,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct SupabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub anon_key: String,
}

/// File-backed collaborators for development without a hosted project.
#[derive(Debug, Clone, Deserialize)]
pub struct LocalConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default)]
    pub admin_email: String,
    /// Plain password, hashed with argon2 at startup. Prefer `admin_password_hash`.
    #[serde(default)]
    pub admin_password: Option<String>,
    #[serde(default)]
    pub admin_password_hash: Option<String>,
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: u64,
    /// Base URL under which uploaded objects are reachable, e.g. `http://127.0.0.1:8080`.
    #[serde(default)]
    pub public_base_url: String,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            admin_email: String::new(),
            admin_password: None,
            admin_password_hash: None,
            jwt_secret: String::new(),
            token_ttl_secs: default_token_ttl(),
            public_base_url: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_bucket")]
    pub bucket: String,
    #[serde(default = "default_project_prefix")]
    pub project_image_prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { bucket: default_bucket(), project_image_prefix: default_project_prefix() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConsoleConfig {
    /// Show a dismissible notice when a backend call fails instead of
    /// swallowing the failure silently.
    #[serde(default = "default_true")]
    pub surface_failures: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self { surface_failures: true }
    }
}

fn default_assets_dir() -> String { "assets".into() }
fn default_data_dir() -> String { "data".into() }
fn default_token_ttl() -> u64 { 3600 }
fn default_bucket() -> String { "portfolio-images".into() }
fn default_project_prefix() -> String { "projects".into() }
fn default_true() -> bool { true }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    load_from_str(&content)
}

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    /// Load `config.toml` (or `CONFIG_PATH`) when present, otherwise start
    /// from defaults; then fill blanks from the environment and validate.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = match load_default() {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::debug!(error = %e, "no config file; using defaults and environment");
                AppConfig::default()
            }
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        if let Some(kind) = env_nonempty("BACKEND") {
            self.backend.kind = match kind.to_ascii_lowercase().as_str() {
                "supabase" => BackendKind::Supabase,
                "local" => BackendKind::Local,
                other => return Err(anyhow!("unknown BACKEND `{other}` (expected supabase|local)")),
            };
        }
        if let Some(v) = env_nonempty("SURFACE_FAILURES") {
            self.console.surface_failures = !matches!(v.as_str(), "0" | "false" | "no");
        }
        self.storage.normalize_from_env();
        match self.backend.kind {
            BackendKind::Supabase => {
                self.supabase.normalize_from_env();
                self.supabase.validate()?;
            }
            BackendKind::Local => {
                self.local.normalize_from_env(&self.server);
                self.local.validate()?;
            }
        }
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if let Some(host) = env_nonempty("SERVER_HOST") {
            self.host = host;
        }
        if let Some(port) = env_nonempty("SERVER_PORT") {
            self.port = port.parse().map_err(|_| anyhow!("SERVER_PORT must be a port number"))?;
        }
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        if let Some(w) = env_nonempty("TOKIO_WORKER_THREADS").and_then(|v| v.parse::<usize>().ok()) {
            self.worker_threads = Some(w);
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            _ => {}
        }
        Ok(())
    }
}

impl SupabaseConfig {
    pub fn normalize_from_env(&mut self) {
        if self.url.trim().is_empty() {
            if let Some(url) = env_nonempty("SUPABASE_URL") {
                self.url = url;
            }
        }
        if self.anon_key.trim().is_empty() {
            if let Some(key) = env_nonempty("SUPABASE_ANON_KEY") {
                self.anon_key = key;
            }
        }
        self.url = self.url.trim().trim_end_matches('/').to_string();
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.is_empty() {
            return Err(anyhow!("supabase.url is empty; set it in config.toml or SUPABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("https://") || lower.starts_with("http://")) {
            return Err(anyhow!("supabase.url must start with http:// or https://"));
        }
        if self.anon_key.trim().is_empty() {
            return Err(anyhow!("supabase.anon_key is empty; set it in config.toml or SUPABASE_ANON_KEY"));
        }
        Ok(())
    }
}

impl LocalConfig {
    pub fn normalize_from_env(&mut self, server: &ServerConfig) {
        if let Some(dir) = env_nonempty("DATA_DIR") {
            self.data_dir = dir;
        }
        if self.admin_email.trim().is_empty() {
            if let Some(email) = env_nonempty("ADMIN_EMAIL") {
                self.admin_email = email;
            }
        }
        if self.admin_password_hash.is_none() {
            self.admin_password_hash = env_nonempty("ADMIN_PASSWORD_HASH");
        }
        if self.admin_password.is_none() {
            self.admin_password = env_nonempty("ADMIN_PASSWORD");
        }
        if self.jwt_secret.trim().is_empty() {
            if let Some(secret) = env_nonempty("JWT_SECRET") {
                self.jwt_secret = secret;
            }
        }
        if self.public_base_url.trim().is_empty() {
            self.public_base_url = env_nonempty("PUBLIC_BASE_URL")
                .unwrap_or_else(|| format!("http://{}:{}", server.host, server.port));
        }
        self.public_base_url = self.public_base_url.trim_end_matches('/').to_string();
    }

    pub fn validate(&self) -> Result<()> {
        if !self.admin_email.contains('@') {
            return Err(anyhow!("local.admin_email must be an email address (ADMIN_EMAIL)"));
        }
        if self.admin_password.is_none() && self.admin_password_hash.is_none() {
            return Err(anyhow!("local backend needs admin_password or admin_password_hash"));
        }
        if self.jwt_secret.len() < 16 {
            return Err(anyhow!("local.jwt_secret must be at least 16 bytes (JWT_SECRET)"));
        }
        if self.token_ttl_secs == 0 {
            return Err(anyhow!("local.token_ttl_secs must be positive"));
        }
        Ok(())
    }
}

impl StorageConfig {
    fn normalize_from_env(&mut self) {
        if let Some(bucket) = env_nonempty("STORAGE_BUCKET") {
            self.bucket = bucket;
        }
        self.project_image_prefix = self.project_image_prefix.trim_matches('/').to_string();
        if self.project_image_prefix.is_empty() {
            self.project_image_prefix = default_project_prefix();
        }
    }
}
