#[derive(clap::Parser, Debug, Clone)]
#[clap(name = "fdk", about = "FDK cone-beam reconstruction, with analytic variance")]
pub struct Cli {

    /// TOML file describing the filter, acquisition geometry, detector and volume
    #[clap(short, long, default_value = "fdk-config.toml")]
    pub config: PathBuf,

    /// Raw f32 projections, laid out [projection, row, column]
    #[clap(short, long)]
    pub input: PathBuf,

    /// Raw f32 per-pixel variance of the projections. The variance of the
    /// reconstruction is only computed if this is given
    #[clap(short, long)]
    pub variance: Option<PathBuf>,

    /// Where to write the reconstructed volume
    #[clap(short, long, default_value = "fdk.raw")]
    pub output: PathBuf,

    /// Where to write the variance volume
    #[clap(long, default_value = "fdk-variance.raw")]
    pub variance_output: PathBuf,

    /// Maximum number of rayon threads, overriding the config file
    #[clap(short = 'j', long)]
    pub threads: Option<usize>,
}

// ----- Imports -----------------------------------------------------------------------------------------
use std::path::PathBuf;
