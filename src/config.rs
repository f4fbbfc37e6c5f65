use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use crate::models::{Category, UserId};
use crate::telegram::{CALLBACK_PREFIX, MAX_CALLBACK_BYTES};

/// Environment variable that overrides `[bot].token`.
pub const TOKEN_ENV: &str = "INSTR_BOT_TOKEN";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub bot: BotConfig,
    pub access: AccessConfig,
    pub repository: RepositoryConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub render: RenderConfig,
    pub categories: Vec<Category>,
    #[serde(default)]
    pub messages: Messages,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct BotConfig {
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AccessConfig {
    pub allowed_users: Vec<UserId>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RepositoryConfig {
    pub url_template: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_fetch_budget_secs")]
    pub fetch_budget_secs: u64,
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
}

fn default_page_size() -> usize {
    50
}
fn default_request_timeout_secs() -> u64 {
    15
}
fn default_fetch_budget_secs() -> u64 {
    120
}
fn default_max_pages() -> usize {
    10_000
}

impl RepositoryConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn fetch_budget(&self) -> Duration {
        Duration::from_secs(self.fetch_budget_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: default_idle_timeout_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

fn default_idle_timeout_secs() -> u64 {
    3600
}
fn default_sweep_interval_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct RenderConfig {
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_message_chars: default_max_message_chars(),
            max_messages: default_max_messages(),
        }
    }
}

/// Telegram's limit for a single text message, in UTF-16 code units.
fn default_max_message_chars() -> usize {
    4096
}
fn default_max_messages() -> usize {
    5
}

/// User-facing texts. Every field defaults to the wording the bot has
/// always used, so the `[messages]` section is entirely optional.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Messages {
    pub access_denied: String,
    pub choose_category: String,
    pub category_not_found: String,
    /// `{category}` is replaced with the selected label.
    pub category_selected: String,
    pub data_not_loaded: String,
    /// `{term}` is replaced with the user's query.
    pub not_found: String,
    pub multiple_found: String,
    pub too_many: String,
    pub back_to_menu: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            access_denied: "Извините, у вас нет доступа к этому боту.".to_string(),
            choose_category:
                "Выберите серию поезда, чтобы я мог понять, в каких папках искать инструкцию:"
                    .to_string(),
            category_not_found: "Ошибка: категория не найдена.".to_string(),
            category_selected: "Выбрана серия поезда: {category}\n\nВведите номер инструкции:"
                .to_string(),
            data_not_loaded: "Данные не загружены. Попробуйте снова.".to_string(),
            not_found: "Инструкция с номером '{term}' не найдена.".to_string(),
            multiple_found: "Найдено несколько инструкций:".to_string(),
            too_many: "Вы запрашиваете слишком большое количество инструкций. \
                       Введите более точный номер инструкции или название."
                .to_string(),
            back_to_menu: "Назад в меню".to_string(),
        }
    }
}

impl Config {
    /// Looks up a category by its exact label.
    pub fn category(&self, label: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.label == label)
    }

    pub fn allowed_users(&self) -> HashSet<UserId> {
        self.access.allowed_users.iter().copied().collect()
    }

    /// Resolves the bot token, preferring the environment over the file.
    pub fn bot_token(&self) -> Result<String> {
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            if !token.trim().is_empty() {
                return Ok(token);
            }
        }
        self.bot
            .token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .with_context(|| format!("bot token not set: use [bot].token or {}", TOKEN_ENV))
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    // Validate access
    if config.access.allowed_users.is_empty() {
        anyhow::bail!("access.allowed_users must not be empty");
    }

    // Validate repository
    if !config.repository.url_template.contains("{folder_id}") {
        anyhow::bail!("repository.url_template must contain '{{folder_id}}'");
    }
    if config.repository.page_size == 0 {
        anyhow::bail!("repository.page_size must be > 0");
    }
    if config.repository.request_timeout_secs == 0 || config.repository.fetch_budget_secs == 0 {
        anyhow::bail!("repository timeouts must be > 0");
    }
    if config.repository.max_pages == 0 {
        anyhow::bail!("repository.max_pages must be > 0");
    }

    // Validate categories
    if config.categories.is_empty() {
        anyhow::bail!("at least one [[categories]] entry is required");
    }
    let mut seen = HashSet::new();
    for category in &config.categories {
        if category.label.trim().is_empty() {
            anyhow::bail!("category labels must not be empty");
        }
        if category.folder_ids.is_empty() {
            anyhow::bail!("category '{}' has no folder_ids", category.label);
        }
        if CALLBACK_PREFIX.len() + category.label.len() > MAX_CALLBACK_BYTES {
            anyhow::bail!(
                "category label '{}' is too long for a button ({} bytes max)",
                category.label,
                MAX_CALLBACK_BYTES - CALLBACK_PREFIX.len()
            );
        }
        if !seen.insert(category.label.as_str()) {
            anyhow::bail!("duplicate category label: '{}'", category.label);
        }
    }

    // Validate session
    if config.session.idle_timeout_secs == 0 || config.session.sweep_interval_secs == 0 {
        anyhow::bail!("session timeouts must be > 0");
    }

    // Validate render
    if config.render.max_message_chars < 64 {
        anyhow::bail!("render.max_message_chars must be >= 64");
    }
    if config.render.max_messages == 0 {
        anyhow::bail!("render.max_messages must be >= 1");
    }

    Ok(config)
}
