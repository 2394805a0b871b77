use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize tracing for the upload pipeline.
///
/// Production environments log JSON lines, everything else uses the human readable
/// formatter. `RUST_LOG` overrides the default `showroom=debug,info` filter. Calling this
/// more than once is harmless: later calls leave the installed subscriber in place.
pub fn init_telemetry(
    service_name: &str,
    environment: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "showroom=debug,info".into());

    let is_production = matches!(environment.to_lowercase().as_str(), "production" | "prod");
    let fmt_layer = if is_production {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    if tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        tracing::debug!("Tracing subscriber already installed");
        return Ok(());
    }

    tracing::info!(
        service_name = service_name,
        environment = environment,
        "Telemetry initialized"
    );
    Ok(())
}

pub async fn shutdown_telemetry() {
    tracing::debug!("Telemetry shutdown");
}
