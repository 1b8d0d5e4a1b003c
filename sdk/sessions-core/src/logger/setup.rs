//! Setup logging subsystem.
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use super::config;
use crate::error::LoggerError;

/// Crates of this workspace, logged at the configured level while everything else stays at WARN.
const WORKSPACE_CRATES: [&str; 7] = [
    "checkout_common_enums",
    "checkout_common_utils",
    "domain_types",
    "interfaces",
    "external_services",
    "action_core",
    "sessions_core",
];

/// Contains guards necessary for logging
#[derive(Debug)]
pub struct TelemetryGuard {
    _log_guards: Vec<WorkerGuard>,
}

type BoxedLayer = Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync>;

/// Setup logging sub-system specifying the logging configuration, service name, and a list of
/// external crates for which a more verbose logging must be enabled. All crates within the
/// workspace are always considered for verbose logging.
pub fn setup(
    config: &config::Log,
    service_name: &str,
    crates_to_filter: impl AsRef<[&'static str]>,
) -> Result<TelemetryGuard, LoggerError> {
    let mut guards = Vec::new();
    let mut subscriber_layers: Vec<BoxedLayer> = Vec::new();

    if config.console.enabled {
        let directive = config.console.filtering_directive.clone().unwrap_or_else(|| {
            get_envfilter_directive(
                tracing::Level::WARN,
                config.console.level.into_level(),
                crates_to_filter.as_ref(),
            )
        });
        let filter = build_filter(&directive)?;
        let (console_writer, guard) = tracing_appender::non_blocking(std::io::stdout());
        guards.push(guard);

        let layer = match config.console.log_format {
            config::LogFormat::Default => fmt::layer()
                .with_writer(console_writer)
                .with_target(true)
                .with_filter(filter)
                .boxed(),
            config::LogFormat::Json => {
                // Disable color or emphasis related ANSI escape codes for JSON formats
                error_stack::Report::set_color_mode(error_stack::fmt::ColorMode::None);

                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(console_writer)
                    .with_filter(filter)
                    .boxed()
            }
        };
        subscriber_layers.push(layer);
    }

    if config.file.enabled {
        let directive = get_envfilter_directive(
            tracing::Level::WARN,
            config.file.level.into_level(),
            crates_to_filter.as_ref(),
        );
        let filter = build_filter(&directive)?;
        let file_appender = tracing_appender::rolling::hourly(&config.file.path, &config.file.file_name);
        let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
        guards.push(guard);

        subscriber_layers.push(
            fmt::layer()
                .json()
                .with_writer(file_writer)
                .with_filter(filter)
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(subscriber_layers)
        .try_init()
        .map_err(|_| LoggerError::SubscriberAlreadySet)?;

    tracing::info!(
        service_name,
        build_version = crate::version!(),
        "Logging subsystem initialized"
    );

    // Returning the TelemetryGuard for logs to be printed until it is dropped
    Ok(TelemetryGuard {
        _log_guards: guards,
    })
}

fn build_filter(directive: &str) -> Result<EnvFilter, LoggerError> {
    EnvFilter::builder()
        .parse(directive)
        .map_err(|error| LoggerError::InvalidDirective(error.to_string()))
}

fn get_envfilter_directive(
    default_log_level: tracing::Level,
    filter_log_level: tracing::Level,
    crates_to_filter: impl AsRef<[&'static str]>,
) -> String {
    let mut explicitly_handled_targets = WORKSPACE_CRATES.to_vec();
    explicitly_handled_targets.extend(crates_to_filter.as_ref());

    // +1 for the default log level added as a directive
    let num_directives = explicitly_handled_targets.len() + 1;

    explicitly_handled_targets
        .into_iter()
        .map(|crate_name| crate_name.replace('-', "_"))
        .zip(std::iter::repeat(filter_log_level))
        .fold(
            {
                let mut directives = Vec::with_capacity(num_directives);
                directives.push(default_log_level.to_string());
                directives
            },
            |mut directives, (target, level)| {
                directives.push(format!("{target}={level}"));
                directives
            },
        )
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_lists_workspace_and_extra_crates() {
        let directive =
            get_envfilter_directive(tracing::Level::WARN, tracing::Level::DEBUG, ["my-app"]);

        assert!(directive.starts_with("WARN,"));
        assert!(directive.contains("action_core=DEBUG"));
        assert!(directive.contains("sessions_core=DEBUG"));
        assert!(directive.ends_with("my_app=DEBUG"));
    }

    #[test]
    fn invalid_directive_is_rejected() {
        assert!(matches!(
            build_filter("sessions_core=loud"),
            Err(LoggerError::InvalidDirective(_))
        ));
    }
}
