use tracing::warn;
use tracing_subscriber::{
    filter::EnvFilter, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt, Registry,
};

/// Lets the filter be swapped once the config file has been read.
pub struct LogLevelHandle {
    handle: reload::Handle<EnvFilter, Registry>,
    from_env: bool,
}

impl LogLevelHandle {
    /// Switch to `level` unless `RUST_LOG` is in charge.
    pub fn set_level(&self, level: &str) {
        if self.from_env {
            return;
        }
        match EnvFilter::try_new(level) {
            Ok(filter) => {
                if let Err(e) = self.handle.reload(filter) {
                    warn!("Could not change log level to '{}': {}", level, e);
                }
            }
            Err(e) => warn!("Invalid log level '{}': {}", level, e),
        }
    }
}

/// Install the console subscriber. Logs go to stderr so stdout stays free for
/// the status line. `RUST_LOG` overrides `level`.
///
/// Returns None if a subscriber is already installed.
pub fn init(level: &str) -> Option<LogLevelHandle> {
    let (filter, from_env) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, true),
        Err(_) => (EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info")), false),
    };
    let (filter, handle) = reload::Layer::new(filter);

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .try_init()
        .ok()?;
    Some(LogLevelHandle { handle, from_env })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_refused_and_level_can_change() {
        let first = init("debug");
        assert!(init("info").is_none());

        let handle = first.expect("first install succeeds");
        handle.set_level("warn");
        handle.set_level("not a [valid filter");
    }
}
