use std::io;

use clap::ValueEnum;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub(crate) fn level(self) -> Level {
        match self {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

/// Our own targets log at `level`; everything else is held to warnings.
pub(crate) fn effective_level(target: &str, level: Level) -> Level {
    if is_koala_target(target) {
        level
    } else {
        level.min(Level::WARN)
    }
}

fn is_koala_target(target: &str) -> bool {
    target.starts_with("koala") || target == "core" || target.starts_with("core::")
}

pub(crate) fn setup_tracing(log_level: LogLevel) {
    let level = log_level.level();
    let filter_layer = tracing_subscriber::filter::filter_fn(move |metadata| {
        metadata.level() <= &effective_level(metadata.target(), level)
    });
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_writer(io::stderr);

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(filter_layer))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn third_party_targets_are_capped_at_warn() {
        assert_eq!(effective_level("gltf::import", Level::DEBUG), Level::WARN);
        assert_eq!(effective_level("zip::write", Level::ERROR), Level::ERROR);
        assert_eq!(effective_level("core::mesh_io", Level::DEBUG), Level::DEBUG);
        assert_eq!(effective_level("koala::headless", Level::TRACE), Level::TRACE);
    }
}
