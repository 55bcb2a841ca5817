use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVE: &str = "vigil=info";

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` is honoured; `filter` (or `vigil=info` when absent) is added on
/// top of it. Does nothing if a subscriber is already installed, so tests and
/// embedding processes can call it freely.
pub fn init_tracing(filter: Option<&str>, json: bool) -> anyhow::Result<()> {
    let mut env_filter = EnvFilter::from_default_env();
    for directive in filter.unwrap_or(DEFAULT_DIRECTIVE).split(',') {
        let directive = directive.trim();
        if directive.is_empty() {
            continue;
        }
        env_filter = env_filter.add_directive(directive.parse()?);
    }

    let builder = tracing_subscriber::fmt().with_env_filter(env_filter);
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if installed.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
    Ok(())
}
