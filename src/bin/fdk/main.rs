mod cli;
use cli::*;

fn main() -> Result<(), Box<dyn Error>> {

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let Cli { config, input, variance, output, variance_output, threads } = Cli::parse();

    // Set up progress reporting and timing
    let mut now = Instant::now();
    let mut report_time = |message: &str| {
        println!("{}: {} ms", message, group_digits(now.elapsed().as_millis()));
        now = Instant::now();
    };

    let config = read_config_file(&config)?;
    let recon    = config.filter.recon_config()?;
    let geometry = config.geometry.geometry()?;
    let detector = config.detector.grid()?;
    let grid     = config.volume.grid()?;
    report_time(&format!("Read config: {} projections, {:?} voxels", geometry.record_count(), grid.n));

    // Zero lets rayon choose
    let n_threads = threads.or(config.threads).unwrap_or(0);
    let pool = rayon::ThreadPoolBuilder::new().num_threads(n_threads).build()?;
    println!("Using up to {} threads.", pool.current_num_threads());

    let projections = read_projections(&input, detector, geometry.record_count())?;
    report_time(&format!("Read {} pixels from {input:?}", group_digits(projections.data().len())));

    match variance {
        None => {
            let volume = pool.install(|| FdkReconstruction::new(&geometry, grid, recon)?.run(projections))?;
            report_time("Reconstructed");
            write(&volume, &output)?;
            report_time(&format!("Wrote volume to {output:?}"));
        },
        Some(variance) => {
            let variance = read_projections(&variance, detector, geometry.record_count())?;
            report_time("Read projection variance");
            let (volume, variance) = pool.install(|| {
                reconstruct_with_variance(&geometry, grid, recon, projections, variance)
            })?;
            report_time("Reconstructed volume and variance");
            write(&volume, &output)?;
            write(&variance, &variance_output)?;
            report_time(&format!("Wrote volumes to {output:?} and {variance_output:?}"));
        },
    }
    Ok(())
}

fn write(volume: &Volume, path: &Path) -> Result<(), Box<dyn Error>> {
    if let Some(dir) = path.parent() {
        create_dir_all(dir)?;
    }
    write_volume(volume, path)?;
    Ok(())
}

// ----- Imports -----------------------------------------------------------------------------------------
use std::error::Error;
use std::fs::create_dir_all;
use std::path::Path;
use std::time::Instant;

use clap::Parser;

use conebeam::{
    FdkReconstruction, Volume, reconstruct_with_variance,
    config::fdk::read_config_file,
    io::{read_projections, write_volume},
    utils::group_digits,
};
