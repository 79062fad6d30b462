use crate::commands::seed::verification_failure_message;
use crate::commands::CommandResult;
use carelog_core::config::{AppConfig, LoadOptions};
use carelog_db::{connect_with_settings, migrations, DemoDataset, SeedSummary, DEMO_USER_NAME};

/// Unlike `seed`, this always starts over: flagged rows are deleted
/// first, so a demo session that logged extra entries comes back clean.
pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "reset-demo",
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
                "reset-demo",
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

        let removed = DemoDataset::clean(&pool)
            .await
            .map_err(|error| ("reset_execution", error.to_string(), 5u8))?;

        let summary = DemoDataset::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

        let verification = DemoDataset::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        let run_result: Result<(u64, SeedSummary), (&'static str, String, u8)> =
            if verification.all_present {
                Ok((removed, summary))
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
        Ok((removed, summary)) => CommandResult::success(
            "reset-demo",
            format!(
                "demo history reset for {DEMO_USER_NAME}: removed {removed} rows, reseeded {} glucose readings, {} meals, {} exercise sessions",
                summary.glucose_readings, summary.meals, summary.exercise_sessions
            ),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("reset-demo", error_class, message, exit_code)
        }
    }
}
