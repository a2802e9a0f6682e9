use std::process::ExitCode;

use tracing::{error, info};

use gatekeeper::{Config, CredentialStore, LockoutPolicy};

fn main() -> ExitCode {
    let config = match Config::load_with_env("gatekeeper.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load gatekeeper.toml: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    if let Err(e) = gatekeeper::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        if let Err(e) = gatekeeper::logging::init_console_only(&config.logging.level) {
            eprintln!("Falling back to no logging: {e}");
        }
    }

    if let Err(e) = config.validate() {
        error!("{e}");
        return ExitCode::FAILURE;
    }

    info!("Initialization starting.");
    info!("Utilizing database path '{}'.", config.store.path);

    let store = match CredentialStore::open(&config.store.path) {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to load credential store: {e}");
            return ExitCode::FAILURE;
        }
    };

    let policy = LockoutPolicy::from(&config.auth);
    info!(
        users = store.len(),
        max_login_attempts = policy.max_attempts,
        "Initialization complete."
    );

    if let Err(e) = store.close(&config.store.path) {
        error!("Failed to save credential store: {e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
