use tracing_subscriber::EnvFilter;

/// Installs a stderr subscriber when `PYCOFFEE_LOG` or `RUST_LOG` is set.
///
/// `PYCOFFEE_LOG` wins when both are present; both take `RUST_LOG` syntax.
pub(crate) fn init() {
    let filter = match std::env::var("PYCOFFEE_LOG") {
        Ok(directives) => EnvFilter::builder().parse_lossy(directives),
        Err(_) if std::env::var_os("RUST_LOG").is_some() => EnvFilter::from_default_env(),
        Err(_) => return,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
