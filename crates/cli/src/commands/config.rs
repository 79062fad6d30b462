use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use carelog_core::config::{AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let api_key = if config.llm.api_key.is_some() { "<redacted>" } else { "<unset>" };
    let base_url = config.llm.base_url.as_deref().unwrap_or("<unset>").to_string();

    // Secrets never render. The api key only reports presence.
    let entries: Vec<(&str, &[&str], String)> = vec![
        ("database.url", &["CARELOG_DATABASE_URL"], config.database.url.clone()),
        (
            "database.max_connections",
            &["CARELOG_DATABASE_MAX_CONNECTIONS"],
            config.database.max_connections.to_string(),
        ),
        (
            "database.timeout_secs",
            &["CARELOG_DATABASE_TIMEOUT_SECS"],
            config.database.timeout_secs.to_string(),
        ),
        ("llm.provider", &["CARELOG_LLM_PROVIDER"], format!("{:?}", config.llm.provider)),
        ("llm.model", &["CARELOG_LLM_MODEL"], config.llm.model.clone()),
        ("llm.base_url", &["CARELOG_LLM_BASE_URL"], base_url),
        ("llm.api_key", &["CARELOG_LLM_API_KEY"], api_key.to_string()),
        (
            "llm.timeout_secs",
            &["CARELOG_LLM_TIMEOUT_SECS"],
            config.llm.timeout_secs.to_string(),
        ),
        ("llm.max_retries", &["CARELOG_LLM_MAX_RETRIES"], config.llm.max_retries.to_string()),
        ("knowledge.top_k", &["CARELOG_KNOWLEDGE_TOP_K"], config.knowledge.top_k.to_string()),
        (
            "knowledge.min_score",
            &["CARELOG_KNOWLEDGE_MIN_SCORE"],
            config.knowledge.min_score.to_string(),
        ),
        (
            "agent.min_history",
            &["CARELOG_AGENT_MIN_HISTORY"],
            config.agent.min_history.to_string(),
        ),
        (
            "agent.specialist_timeout_secs",
            &["CARELOG_AGENT_SPECIALIST_TIMEOUT_SECS"],
            config.agent.specialist_timeout_secs.to_string(),
        ),
        (
            "agent.bands.low_below",
            &["CARELOG_AGENT_BANDS_LOW_BELOW"],
            config.agent.bands.low_below.to_string(),
        ),
        (
            "agent.bands.in_range_max",
            &["CARELOG_AGENT_BANDS_IN_RANGE_MAX"],
            config.agent.bands.in_range_max.to_string(),
        ),
        (
            "agent.bands.elevated_max",
            &["CARELOG_AGENT_BANDS_ELEVATED_MAX"],
            config.agent.bands.elevated_max.to_string(),
        ),
        (
            "server.bind_address",
            &["CARELOG_SERVER_BIND_ADDRESS"],
            config.server.bind_address.clone(),
        ),
        ("server.port", &["CARELOG_SERVER_PORT"], config.server.port.to_string()),
        (
            "server.graceful_shutdown_secs",
            &["CARELOG_SERVER_GRACEFUL_SHUTDOWN_SECS"],
            config.server.graceful_shutdown_secs.to_string(),
        ),
        (
            "logging.level",
            &["CARELOG_LOGGING_LEVEL", "CARELOG_LOG_LEVEL"],
            config.logging.level.clone(),
        ),
        (
            "logging.format",
            &["CARELOG_LOGGING_FORMAT", "CARELOG_LOG_FORMAT"],
            format!("{:?}", config.logging.format),
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key, env_keys, value) in entries {
        let source =
            field_source(key, env_keys, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(format!("- {key} = {value} (source: {source})"));
    }

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("carelog.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/carelog.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    for env_key in env_keys {
        if env::var_os(env_key).is_some() {
            return format!("env ({env_key})");
        }
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}
