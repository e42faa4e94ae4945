use tracing_subscriber::EnvFilter;

/// Inicializa el logging en stderr (stdout lleva las filas).
///
/// `RUST_LOG` tiene prioridad sobre el nivel recibido. Los registros del
/// facade `log` se reenvían al subscriber.
pub fn init(log_level: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt().with_env_filter(env_filter)
                             .with_target(false)
                             .with_writer(std::io::stderr)
                             .init();
}
