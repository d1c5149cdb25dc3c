//! Quiz configuration and gateway factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use netquiz_core::integrity::IntegrityConfig;
use netquiz_core::ratelimit::RateLimitPolicy;
use netquiz_core::traits::{Candidate, NotificationGateway};

use crate::emailjs::{EmailJsGateway, EmailJsSettings, DEFAULT_TIMEOUT_SECS};
use crate::log::LogGateway;

/// Environment variable that overrides the EmailJS public key.
pub const PUBLIC_KEY_ENV: &str = "NETQUIZ_EMAILJS_PUBLIC_KEY";

/// Where completion and termination reports go.
///
/// Note: Custom Debug impl masks the public key to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GatewayConfig {
    EmailJs {
        service_id: String,
        completion_template_id: String,
        termination_template_id: String,
        #[serde(default)]
        public_key: String,
        recipient_email: String,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default = "default_timeout")]
        timeout_secs: u64,
    },
    Log {
        #[serde(default)]
        recipient_email: String,
    },
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig::Log {
            recipient_email: String::new(),
        }
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GatewayConfig::EmailJs {
                service_id,
                completion_template_id,
                termination_template_id,
                public_key: _,
                recipient_email,
                base_url,
                timeout_secs,
            } => f
                .debug_struct("EmailJs")
                .field("service_id", service_id)
                .field("completion_template_id", completion_template_id)
                .field("termination_template_id", termination_template_id)
                .field("public_key", &"***")
                .field("recipient_email", recipient_email)
                .field("base_url", base_url)
                .field("timeout_secs", timeout_secs)
                .finish(),
            GatewayConfig::Log { recipient_email } => f
                .debug_struct("Log")
                .field("recipient_email", recipient_email)
                .finish(),
        }
    }
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Top-level netquiz configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizConfig {
    /// Question bank file used when a command is not given `--bank`.
    #[serde(default)]
    pub question_bank: Option<PathBuf>,
    /// Directory holding persisted session state.
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
    #[serde(default)]
    pub candidate: Candidate,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub rate_limit: RateLimitPolicy,
    #[serde(default)]
    pub integrity: IntegrityConfig,
}

fn default_state_dir() -> PathBuf {
    PathBuf::from("./.netquiz")
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            question_bank: None,
            state_dir: default_state_dir(),
            candidate: Candidate::default(),
            gateway: GatewayConfig::default(),
            rate_limit: RateLimitPolicy::default(),
            integrity: IntegrityConfig::default(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

fn resolve_gateway_config(config: &GatewayConfig) -> GatewayConfig {
    match config {
        GatewayConfig::EmailJs {
            service_id,
            completion_template_id,
            termination_template_id,
            public_key,
            recipient_email,
            base_url,
            timeout_secs,
        } => GatewayConfig::EmailJs {
            service_id: resolve_env_vars(service_id),
            completion_template_id: resolve_env_vars(completion_template_id),
            termination_template_id: resolve_env_vars(termination_template_id),
            public_key: resolve_env_vars(public_key),
            recipient_email: resolve_env_vars(recipient_email),
            base_url: base_url.as_ref().map(|u| resolve_env_vars(u)),
            timeout_secs: *timeout_secs,
        },
        GatewayConfig::Log { recipient_email } => GatewayConfig::Log {
            recipient_email: resolve_env_vars(recipient_email),
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `netquiz.toml` in the current directory
/// 2. `~/.config/netquiz/config.toml`
///
/// Environment variable override: `NETQUIZ_EMAILJS_PUBLIC_KEY`.
pub fn load_config() -> Result<QuizConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<QuizConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("netquiz.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => QuizConfig::default(),
    };

    Ok(finish_config(config, std::env::var(PUBLIC_KEY_ENV).ok()))
}

/// Parse a configuration document without applying environment overrides.
pub fn parse_config(content: &str) -> Result<QuizConfig> {
    Ok(toml::from_str::<QuizConfig>(content)?)
}

fn finish_config(mut config: QuizConfig, key_override: Option<String>) -> QuizConfig {
    if let (Some(key), GatewayConfig::EmailJs { public_key, .. }) =
        (key_override, &mut config.gateway)
    {
        *public_key = key;
    }
    config.gateway = resolve_gateway_config(&config.gateway);
    config
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("netquiz"))
}

/// Create a gateway instance from its configuration.
pub fn create_gateway(config: &GatewayConfig) -> Result<Arc<dyn NotificationGateway>> {
    match config {
        GatewayConfig::EmailJs {
            service_id,
            completion_template_id,
            termination_template_id,
            public_key,
            recipient_email,
            base_url,
            timeout_secs,
        } => {
            let gateway = EmailJsGateway::new(EmailJsSettings {
                service_id: service_id.clone(),
                completion_template_id: completion_template_id.clone(),
                termination_template_id: termination_template_id.clone(),
                public_key: public_key.clone(),
                recipient_email: recipient_email.clone(),
                base_url: base_url.clone(),
                timeout_secs: *timeout_secs,
            })
            .context("failed to create EmailJS gateway")?;
            Ok(Arc::new(gateway))
        }
        GatewayConfig::Log { recipient_email } => Ok(Arc::new(LogGateway::new(recipient_email))),
    }
}
