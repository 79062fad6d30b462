use crate::commands::CommandResult;
use carelog_core::config::{AppConfig, LoadOptions};
use carelog_db::{connect_with_settings, migrations, DemoDataset, SeedSummary, DEMO_USER_NAME};

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "seed",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "seed",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        // Idempotent: a second run leaves an already seeded week alone.
        let summary = DemoDataset::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

        let verification = DemoDataset::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        let run_result: Result<SeedSummary, (&'static str, String, u8)> =
            if verification.all_present {
                Ok(summary)
            } else {
                Err((
                    "seed_verification",
                    verification_failure_message(&verification.checks),
                    6u8,
                ))
            };

        pool.close().await;
        run_result
    });

    match result {
        Ok(summary) => CommandResult::success("seed", seeded_message(&summary)),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

pub(crate) fn seeded_message(summary: &SeedSummary) -> String {
    format!(
        "demo history ready for {DEMO_USER_NAME}: {} glucose readings, {} meals, {} exercise sessions over the last week",
        summary.glucose_readings, summary.meals, summary.exercise_sessions
    )
}

pub(crate) fn verification_failure_message(checks: &[(&'static str, bool)]) -> String {
    let failed = checks
        .iter()
        .filter_map(|(check, passed)| (!passed).then_some(*check))
        .collect::<Vec<_>>();

    if failed.is_empty() {
        "demo data incomplete after load".to_string()
    } else {
        format!("demo data verification failed for checks: {}", failed.join(", "))
    }
}
