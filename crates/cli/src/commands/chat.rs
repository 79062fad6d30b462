use crate::commands::CommandResult;
use carelog_agent::AgentRuntime;
use carelog_core::config::{AppConfig, LoadOptions};
use carelog_db::repositories::{SqlUserRepository, UserRepository};
use carelog_db::{connect_with_settings, migrations, DEMO_USER_NAME};

/// One assistant turn from the terminal. Prints the reply as plain text;
/// infrastructure failures come back as the JSON envelope instead.
pub fn run(message: &str, user_name: Option<&str>) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "chat",
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
                "chat",
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

        // Chat works on a fresh checkout, so pending migrations run first.
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let users = SqlUserRepository::new(pool.clone());
        let name = user_name.unwrap_or(DEMO_USER_NAME);
        let user = match users
            .find_by_name(name)
            .await
            .map_err(|error| ("db_query", error.to_string(), 4u8))?
        {
            Some(user) => user,
            None => users
                .create(name, name == DEMO_USER_NAME)
                .await
                .map_err(|error| ("db_query", error.to_string(), 4u8))?,
        };

        let agent = AgentRuntime::from_config(&pool, &config)
            .map_err(|error| ("agent_init", error.to_string(), 3u8))?;

        let reply = agent
            .process_message(user.id, message)
            .await
            .map_err(|error| ("agent_error", error.user_message(), 1u8))?;

        pool.close().await;
        Ok::<String, (&'static str, String, u8)>(reply)
    });

    match result {
        Ok(reply) => CommandResult::plain(reply),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("chat", error_class, message, exit_code)
        }
    }
}
