//! CLI argument parsing, validation, and startup helpers.

use crate::ClientConfig;
use crate::api::{MatchingCategory, PromotionPeriod};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::error;
use url::Url;

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "mindmate-admin",
    about = "Admin console for the MindMate service"
)]
pub struct Args {
    /// Base URL of the admin API
    #[arg(long, env = "MINDMATE_API_URL", default_value = "http://localhost:8080")]
    pub api_url: String,

    /// Base URL of the auth endpoints (refresh, logout, OAuth entry point)
    #[arg(long, env = "MINDMATE_AUTH_URL", default_value = "http://localhost/api")]
    pub auth_url: String,

    /// Directory holding the token cookies and local state
    #[arg(long, env = "MINDMATE_STATE_DIR", default_value = ".mindmate")]
    pub state_dir: PathBuf,

    /// Admin account allowed to sign in. Repeat or comma separate; empty allows any account
    #[arg(long = "admin-email", env = "MINDMATE_ADMIN_EMAILS", value_delimiter = ',')]
    pub admin_emails: Vec<String>,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "30", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_secs: u64,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the OAuth sign-in URL
    LoginUrl,
    /// Finish signing in from the URL the OAuth provider redirected to
    Login { callback_url: String },
    /// Sign out and forget stored tokens
    Logout,
    /// Show the signed-in admin and access token expiry
    Whoami,
    /// Fetch the current profile
    Profile,
    /// Suspended users
    SuspendedUsers,
    /// The report feed (suspended users with report counts)
    Reports,
    #[command(subcommand)]
    Emoticons(EmoticonCommand),
    #[command(subcommand)]
    Magazines(MagazineCommand),
    #[command(subcommand)]
    Matchings(MatchingCommand),
    #[command(subcommand)]
    Reviews(ReviewCommand),
    #[command(subcommand)]
    Products(ProductCommand),
    #[command(subcommand)]
    Words(WordCommand),
    /// Push a notification for an announcement
    Announce {
        #[arg(long)]
        title: String,
        #[arg(long)]
        announcement_id: String,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum EmoticonCommand {
    Pending,
    Popular {
        #[arg(long, default_value = "10")]
        limit: u32,
    },
    Upload {
        file: PathBuf,
        #[arg(long)]
        name: String,
        #[arg(long)]
        price: i64,
    },
    Accept { id: i64 },
    Reject { id: i64 },
}

#[derive(Subcommand, Debug, Clone)]
pub enum MagazineCommand {
    List,
    Show { id: i64 },
    Delete { id: i64 },
    Stats,
    Pending {
        #[arg(long, default_value = "0")]
        page: u32,
        #[arg(long, default_value_t = crate::api::DEFAULT_PAGE_SIZE)]
        size: u32,
    },
    Accept { id: i64 },
    Reject { id: i64 },
}

#[derive(Subcommand, Debug, Clone)]
pub enum MatchingCommand {
    List {
        #[arg(long, value_enum)]
        category: MatchingCategory,
        #[arg(long, default_value = "0")]
        page: u32,
        #[arg(long, default_value_t = crate::api::DEFAULT_PAGE_SIZE)]
        size: u32,
    },
    Reject { id: i64 },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ReviewCommand {
    List {
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
        min_rating: Option<u8>,
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
        max_rating: Option<u8>,
        /// Only reported reviews
        #[arg(long)]
        reported: bool,
        #[arg(long, default_value = "0")]
        page: u32,
        #[arg(long, default_value_t = crate::api::DEFAULT_PAGE_SIZE)]
        size: u32,
    },
    Delete { id: i64 },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ProductCommand {
    List,
    Create {
        #[arg(long)]
        points: i64,
        #[arg(long)]
        amount: i64,
        /// Promotion window as start~end
        #[arg(long)]
        promotion: Option<PromotionPeriod>,
    },
    Update {
        product_id: i64,
        #[arg(long)]
        points: i64,
        #[arg(long)]
        amount: i64,
        #[arg(long)]
        promotion: Option<PromotionPeriod>,
    },
    Delete { product_id: i64 },
}

#[derive(Subcommand, Debug, Clone)]
pub enum WordCommand {
    List,
    Add { word: String },
    Update { id: i64, word: String },
    Delete { id: i64 },
    Activate { id: i64 },
    Deactivate { id: i64 },
    /// Reload the server's word cache
    Refresh,
}

/// Initialize logging based on the specified format. Logs go to stderr so
/// command output on stdout stays machine-readable.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt().with_writer(std::io::stderr).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Compact => tracing_subscriber::fmt()
            .compact()
            .with_writer(std::io::stderr)
            .init(),
    }
}

/// Parse and validate a base URL.
/// Returns None and logs an error if validation fails.
pub fn validate_base_url(name: &str, value: &str) -> Option<Url> {
    let url = match Url::parse(value) {
        Ok(url) => url,
        Err(e) => {
            error!(name, url = %value, error = %e, "Invalid URL");
            return None;
        }
    };

    let is_https = url.scheme() == "https";
    let is_localhost = matches!(url.host_str(), Some("localhost") | Some("127.0.0.1"));

    if !is_https && !is_localhost {
        error!(name, "URL must use HTTPS for non-localhost servers");
        return None;
    }

    Some(url)
}

/// Build ClientConfig from validated arguments.
pub fn build_config(args: &Args) -> Option<ClientConfig> {
    let api_url = validate_base_url("api-url", &args.api_url)?;
    let auth_url = validate_base_url("auth-url", &args.auth_url)?;

    let admin_emails = args
        .admin_emails
        .iter()
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .collect();

    Some(ClientConfig {
        api_url,
        auth_url,
        state_dir: args.state_dir.clone(),
        admin_emails,
        timeout: Duration::from_secs(args.timeout_secs),
    })
}
