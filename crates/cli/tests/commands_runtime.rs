use std::env;
use std::sync::{Mutex, OnceLock};

use carelog_cli::commands::{chat, config, doctor, migrate, reset_demo, seed};
use serde_json::Value;

// Shared-cache memory URL so every pool connection inside one command
// sees the same database. The database disappears when the pool closes,
// so each command invocation starts from a clean slate.
const MEMORY_DB: &str = "sqlite::memory:?cache=shared";

#[test]
fn migrate_applies_cleanly_against_memory_database() {
    with_env(&[("CARELOG_DATABASE_URL", MEMORY_DB)], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn migrate_rejects_non_sqlite_database_url() {
    with_env(&[("CARELOG_DATABASE_URL", "postgres://localhost/carelog")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
        let message = payload["message"].as_str().unwrap_or_default();
        assert!(message.contains("database.url"), "message should name the field: {message}");
    });
}

#[test]
fn seed_loads_the_demo_week() {
    with_env(&[("CARELOG_DATABASE_URL", MEMORY_DB)], || {
        let result = seed::run();
        assert_eq!(result.exit_code, 0, "expected successful seed run: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "seed");
        assert_eq!(payload["status"], "ok");

        let message = payload["message"].as_str().unwrap_or_default();
        assert!(
            message.contains("28 glucose readings, 21 meals, 5 exercise sessions"),
            "message should summarize the seeded week: {message}"
        );
    });
}

#[test]
fn reset_demo_cleans_and_reseeds() {
    with_env(&[("CARELOG_DATABASE_URL", MEMORY_DB)], || {
        let result = reset_demo::run();
        assert_eq!(result.exit_code, 0, "expected successful reset run: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "reset-demo");
        assert_eq!(payload["status"], "ok");

        let message = payload["message"].as_str().unwrap_or_default();
        assert!(message.contains("removed 0 rows"), "fresh database has nothing to remove: {message}");
        assert!(
            message.contains("reseeded 28 glucose readings"),
            "reset should reseed the full week: {message}"
        );
    });
}

#[test]
fn doctor_json_reports_each_check_independently() {
    with_env(&[("CARELOG_DATABASE_URL", MEMORY_DB)], || {
        let output = doctor::run(true);
        let payload: Value =
            serde_json::from_str(&output).expect("doctor --json should emit valid JSON");

        let checks = payload["checks"].as_array().expect("checks array");
        assert_eq!(checks.len(), 5);

        let status_of = |name: &str| -> String {
            checks
                .iter()
                .find(|check| check["name"] == name)
                .map(|check| check["status"].as_str().unwrap_or_default().to_string())
                .unwrap_or_default()
        };

        assert_eq!(status_of("config_validation"), "pass");
        assert_eq!(status_of("database_connectivity"), "pass");
        // Doctor never migrates, so a fresh memory database has no schema.
        assert_eq!(status_of("schema_readiness"), "fail");
        assert_eq!(status_of("knowledge_corpus"), "pass");
        assert_eq!(status_of("llm_readiness"), "skipped");

        assert_eq!(payload["overall_status"], "fail");
    });
}

#[test]
fn doctor_skips_dependent_checks_when_config_is_invalid() {
    with_env(&[("CARELOG_DATABASE_URL", "postgres://localhost/carelog")], || {
        let output = doctor::run(false);

        assert!(output.contains("doctor: one or more readiness checks failed"), "{output}");
        assert!(output.contains("- [fail] config_validation"), "{output}");
        assert!(output.contains("- [skip] database_connectivity"), "{output}");
        assert!(output.contains("- [skip] llm_readiness"), "{output}");
    });
}

#[test]
fn config_attributes_env_sources_and_redacts_secrets() {
    with_env(
        &[("CARELOG_DATABASE_URL", MEMORY_DB), ("CARELOG_LLM_MODEL", "test-model")],
        || {
            let output = config::run();

            assert!(
                output.contains(
                    "- database.url = sqlite::memory:?cache=shared (source: env (CARELOG_DATABASE_URL))"
                ),
                "{output}"
            );
            assert!(
                output.contains("- llm.model = test-model (source: env (CARELOG_LLM_MODEL))"),
                "{output}"
            );
            assert!(output.contains("- llm.api_key = <unset> (source: default)"), "{output}");
            assert!(output.contains("- knowledge.top_k = 3 (source: default)"), "{output}");
            assert!(output.contains("- logging.format = Compact (source: default)"), "{output}");
        },
    );
}

#[test]
fn chat_logs_a_glucose_reading_end_to_end() {
    with_env(&[("CARELOG_DATABASE_URL", MEMORY_DB)], || {
        let result = chat::run("my blood sugar is 120", None);
        assert_eq!(result.exit_code, 0, "expected successful chat turn: {}", result.output);
        assert!(
            result.output.contains("Logged your glucose reading of 120 mg/dL"),
            "reply should confirm the logged reading: {}",
            result.output
        );
    });
}

#[test]
fn chat_reports_config_failure_as_envelope() {
    with_env(&[("CARELOG_DATABASE_URL", "postgres://localhost/carelog")], || {
        let result = chat::run("my blood sugar is 120", None);
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "chat");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "CARELOG_DATABASE_URL",
        "CARELOG_DATABASE_MAX_CONNECTIONS",
        "CARELOG_DATABASE_TIMEOUT_SECS",
        "CARELOG_LLM_PROVIDER",
        "CARELOG_LLM_API_KEY",
        "CARELOG_LLM_BASE_URL",
        "CARELOG_LLM_MODEL",
        "CARELOG_LLM_TIMEOUT_SECS",
        "CARELOG_LLM_MAX_RETRIES",
        "CARELOG_KNOWLEDGE_TOP_K",
        "CARELOG_KNOWLEDGE_MIN_SCORE",
        "CARELOG_AGENT_MIN_HISTORY",
        "CARELOG_AGENT_SPECIALIST_TIMEOUT_SECS",
        "CARELOG_AGENT_BANDS_LOW_BELOW",
        "CARELOG_AGENT_BANDS_IN_RANGE_MAX",
        "CARELOG_AGENT_BANDS_ELEVATED_MAX",
        "CARELOG_SERVER_BIND_ADDRESS",
        "CARELOG_SERVER_PORT",
        "CARELOG_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "CARELOG_LOGGING_LEVEL",
        "CARELOG_LOGGING_FORMAT",
        "CARELOG_LOG_LEVEL",
        "CARELOG_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
