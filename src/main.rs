use clap::Parser;
use mindmate_admin::cli::{Args, build_config, init_logging};
use mindmate_admin::{commands, open_client};
use tracing::error;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(&args.log_format);

    let Some(config) = build_config(&args) else {
        std::process::exit(1);
    };

    let api = match open_client(&config) {
        Ok(api) => api,
        Err(e) => {
            error!(error = %e, "Failed to start client");
            std::process::exit(1);
        }
    };

    if let Err(e) = commands::run(&api, args.command).await {
        // The login redirect has already told the operator where to sign in
        if !e.is_session_expired() {
            error!(error = %e, "Command failed");
            eprintln!("error: {}", e);
        }
        std::process::exit(1);
    }
}
