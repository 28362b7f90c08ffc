use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use eco_collect::components::StatusFilter;

#[derive(Debug, Parser)]
#[command(name = "eco-collect")]
#[command(about = "Eco-Collect recycling rewards client", long_about = None)]
pub struct Cli {
    /// Backend base URL, overrides ECO_API_URL
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start a session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "ECO_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// End the current session
    Logout,
    /// Show who the stored session belongs to
    Whoami,
    /// List collection centers
    Centers,
    /// Photograph or pick waste, preview the AI classification, then submit
    Upload(UploadArgs),
    /// Corporate verification of submissions
    #[command(subcommand)]
    Verify(VerifyCommand),
    /// Your submissions with verification status and totals
    History(HistoryArgs),
}

#[derive(Debug, Args)]
pub struct UploadArgs {
    /// Image file to upload
    #[arg(long, conflicts_with = "camera", required_unless_present = "camera")]
    pub file: Option<PathBuf>,

    /// Take the photo with CAMERA_COMMAND instead
    #[arg(long)]
    pub camera: bool,

    /// Weight in kilograms
    #[arg(long)]
    pub weight: Option<String>,

    /// Collection center id
    #[arg(long)]
    pub center: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum VerifyCommand {
    /// List every submission, newest first
    List,
    /// Approve a pending submission
    Approve { id: i64 },
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// all, pending or verified
    #[arg(long, default_value = "all")]
    pub status: StatusFilter,

    /// Only this waste category
    #[arg(long)]
    pub category: Option<String>,

    #[arg(long, default_value_t = 1)]
    pub page: usize,

    /// Page size, defaults to HISTORY_PAGE_LIMIT
    #[arg(long)]
    pub limit: Option<usize>,
}
