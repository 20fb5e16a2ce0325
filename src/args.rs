use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    /// Scripted phases, no camera or model needed
    Simulated,
    /// Recorded model output from a JSON-lines file
    Replay,
    /// Live webcam frames (requires the `camera` feature)
    Camera,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the JSON config (created with defaults if missing)
    #[arg(long, default_value = "sentinel.json")]
    pub config: PathBuf,

    /// Path to the persisted user settings
    #[arg(long, default_value = "settings.json")]
    pub settings: PathBuf,

    /// Where frames come from
    #[arg(long, value_enum, default_value_t = SourceKind::Simulated)]
    pub source: SourceKind,

    /// Recording to replay with `--source replay`
    #[arg(long)]
    pub replay: Option<PathBuf>,

    /// Start the recording over when it ends
    #[arg(long, default_value_t = false)]
    pub loop_replay: bool,

    /// Camera Index (default 0)
    #[arg(short, long, default_value_t = 0)]
    pub cam_index: u32,

    /// Select and save a charity before starting (rc, msf, unicef, wwf, gd)
    #[arg(long)]
    pub charity: Option<String>,

    /// Amount per simulated donation, in cents
    #[arg(long, default_value_t = 100)]
    pub amount_cents: i64,

    /// Make every n-th simulated donation fail
    #[arg(long)]
    pub fail_every: Option<u64>,

    /// Stop after this many seconds instead of waiting for Ctrl-C
    #[arg(long)]
    pub duration_secs: Option<u64>,

    /// Log level or filter (overrides the config file)
    #[arg(long)]
    pub log_level: Option<String>,

    /// List charities and available cameras, then exit
    #[arg(long)]
    pub list: bool,
}
