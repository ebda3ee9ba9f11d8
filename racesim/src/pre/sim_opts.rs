use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser, Clone)]
#[clap(
    version = "0.1.0",
    author = "Alexander Heilmeier <alexander.heilmeier@tum.de>",
    name = "RS-AEGIS",
    about = "A frame-driven race engine for four scripted agents"
)]
pub struct SimOpts {
    // FLAGS ---------------------------------------------------------------------------------------
    /// Activate debug logging
    #[clap(short, long)]
    pub debug: bool,

    /// Read control events from stdin (r = rain toggle, c = crash, p = pause toggle)
    #[clap(short, long)]
    pub interactive: bool,

    // OPTIONS -------------------------------------------------------------------------------------
    /// Set number of simulation runs (runs > 1 are simulated in parallel without live output)
    #[clap(short, long, default_value = "1")]
    pub no_sim_runs: u32,

    /// Set path to the simulation parameter file (if not set, the built-in four-agent field is
    /// used)
    #[clap(short, long)]
    pub parfile_path: Option<PathBuf>,

    /// Set path to a track centerline csv file, laps are counted at its last point (if not set,
    /// the built-in circuit is used)
    #[clap(long)]
    pub trackfile_path: Option<PathBuf>,

    /// Set seed of the random number generator (runs i > 0 use seed + i)
    #[clap(short, long, default_value = "42")]
    pub seed: u64,

    /// Set real-time factor, 0.0 simulates as fast as possible
    #[clap(short, long, default_value = "0.0")]
    pub realtime_factor: f64,

    /// Scripted control events, e.g. "rain@600,rain@900,crash@2400,pause@3000"
    #[clap(long, default_value = "")]
    pub script: String,

    /// Abort the race after this number of frames
    #[clap(short, long, default_value = "2000000")]
    pub max_frames: u64,

    /// Set path of the text result file
    #[clap(short, long)]
    pub output: Option<PathBuf>,

    /// Set path of a JSON result file
    #[clap(long)]
    pub result_json: Option<PathBuf>,
}
