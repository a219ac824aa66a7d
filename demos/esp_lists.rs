//! Print the lists of the provider configured through the environment
//!
//! ```bash
//! export ESP_PROVIDER=mail_chimp
//! export ESP_API_KEY=your_key-us4
//! export ESP_LOG_LEVEL=debug
//!
//! cargo run -p active-esp-demos --bin esp_lists
//! ```
//!
//! Set `ESP_FIND_EMAIL` to also look up a subscriber by email address on
//! providers that support it.

use active_esp::SubscriberQuery;
use std::env;
use std::process::ExitCode;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
#[derive(Debug, Clone, Copy)]
enum DemoExitCode {
    Success = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Provider request failed
    RuntimeError = 2,
}

impl From<DemoExitCode> for ExitCode {
    fn from(code: DemoExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn log_level() -> Level {
    match env::var("ESP_LOG_LEVEL")
        .unwrap_or_default()
        .to_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let subscriber = FmtSubscriber::builder().with_max_level(log_level()).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DemoExitCode::ConfigError.into();
    }

    let esp = match active_esp::configure_from_env() {
        Ok(esp) => esp,
        Err(e) => {
            error!("Configuration error: {}", e);
            return DemoExitCode::ConfigError.into();
        }
    };

    match run(&esp).await {
        Ok(()) => DemoExitCode::Success.into(),
        Err(e) => {
            error!("{}", e);
            DemoExitCode::RuntimeError.into()
        }
    }
}

async fn run(esp: &active_esp::EspConfiguration) -> anyhow::Result<()> {
    let provider = esp.require_provider()?;
    info!("Using {} at {}", provider.provider_name(), provider.endpoint());

    for list in provider.lists().await? {
        println!(
            "{}\t{}",
            list.id.unwrap_or_default(),
            list.name.unwrap_or_default()
        );
    }

    if let Ok(email) = env::var("ESP_FIND_EMAIL") {
        match provider.find_subscriber(&SubscriberQuery::by_email(email)).await {
            Ok(found) => {
                for subscriber in found {
                    println!(
                        "{}\t{}\t{}",
                        subscriber.id.as_deref().unwrap_or("-"),
                        subscriber.email,
                        subscriber.name()
                    );
                }
            }
            Err(e) if e.is_not_implemented() => warn!("{}", e),
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
