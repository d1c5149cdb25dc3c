//! netquiz-notify: Notification gateways and configuration.
//!
//! Implements the `NotificationGateway` trait for the EmailJS REST API and a
//! log-only sink, and loads the `netquiz.toml` configuration that selects
//! between them.

pub mod config;
pub mod emailjs;
pub mod log;
pub mod mock;
pub mod template;

pub use config::{create_gateway, load_config, load_config_from, GatewayConfig, QuizConfig};
pub use emailjs::{EmailJsGateway, EmailJsSettings};
pub use template::{render_params, TemplateParams};
