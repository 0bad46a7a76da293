//! VolunteerHub main entrypoint.

use tracing_subscriber::EnvFilter;
use volunteerhub::run;
use volunteerhub::ui::messages::error;

fn main() {
    // Diagnostics go to stderr; RUST_LOG=volunteerhub=debug for details.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(e) = run() {
        error(format!("Error: {}", e));
        std::process::exit(1);
    }
}
