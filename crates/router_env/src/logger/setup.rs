//!
//! Setup logging subsystem.
//!

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::{env, logger::config};

/// Keeps the non-blocking writers alive for the lifetime of the process.
/// Dropping the guard flushes and stops background logging threads.
#[derive(Debug)]
pub struct TelemetryGuard {
    _log_guards: Vec<WorkerGuard>,
}

/// Setup the logging sub-system, building the console and file layers
/// described by the config. Expects the list of crates whose events should
/// pass the default filter.
pub fn setup<Str: AsRef<str>>(
    conf: &config::Log,
    service_name: &str,
    crates_to_filter: impl AsRef<[Str]>,
) -> TelemetryGuard {
    let mut guards = Vec::new();

    let subscriber = tracing_subscriber::registry();

    let file_layer = if conf.file.enabled {
        let mut path = env::workspace_path();
        path.push(&conf.file.path);

        let file_appender = tracing_appender::rolling::hourly(&path, &conf.file.file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        guards.push(guard);

        let filter = get_envfilter(
            conf.file.filtering_directive.as_ref(),
            conf.file.level.into_level(),
            &crates_to_filter,
        );

        Some(
            fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(filter),
        )
    } else {
        None
    };

    let console_layer = if conf.console.enabled {
        let filter = get_envfilter(
            conf.console.filtering_directive.as_ref(),
            conf.console.level.into_level(),
            &crates_to_filter,
        );

        match conf.console.log_format {
            config::LogFormat::Default => Some(
                fmt::layer()
                    .with_timer(fmt::time::time())
                    .pretty()
                    .with_filter(filter)
                    .boxed(),
            ),
            config::LogFormat::Json => Some(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stdout)
                    .with_filter(filter)
                    .boxed(),
            ),
        }
    } else {
        None
    };

    subscriber.with(file_layer).with(console_layer).init();

    tracing::info!(service = service_name, env = %env::which(), "telemetry initialized");

    TelemetryGuard {
        _log_guards: guards,
    }
}

/// Filter that admits the given crates (and this workspace's crates) at
/// `level`, everything else at WARN; an explicit directive wins outright.
fn get_envfilter<Str: AsRef<str>>(
    filtering_directive: Option<&String>,
    level: tracing::Level,
    crates_to_filter: impl AsRef<[Str]>,
) -> EnvFilter {
    match filtering_directive {
        Some(directive) => EnvFilter::new(directive),
        None => {
            let mut directives = vec![
                "warn".to_string(),
                level_directive("router_env", level),
            ];
            directives.extend(
                crates_to_filter
                    .as_ref()
                    .iter()
                    .map(|crate_name| level_directive(crate_name.as_ref(), level)),
            );
            EnvFilter::new(directives.join(","))
        }
    }
}

fn level_directive(crate_name: &str, level: tracing::Level) -> String {
    format!("{}={}", crate_name.replace('-', "_"), level.as_str().to_lowercase())
}
