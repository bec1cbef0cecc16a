use anyhow::{Context, Result};
use clap::Parser;
use directories::ProjectDirs;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug, Clone)]
#[command(name = "bike-sim")]
#[command(about = "Jump your bike over traffic cones. Crash, and you are out for 58 hours.", long_about = None)]
pub struct Args {
    /// Where the injury record and log live (defaults to the per-user data dir)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Play without sound
    #[arg(long, default_value_t = false)]
    pub mute: bool,

    /// Render rate cap. Physics always runs at 50 ticks per second.
    #[arg(long, default_value_t = 50)]
    pub fps: u32,

    /// Print whether you are injured and exit
    #[arg(long, default_value_t = false)]
    pub status: bool,
}

impl Args {
    /// Resolves and creates the data directory.
    pub fn data_dir(&self) -> Result<PathBuf> {
        let dir = match &self.data_dir {
            Some(d) => d.clone(),
            None => ProjectDirs::from("com", "bike-sim", "BikeSim")
                .context("could not resolve project directories")?
                .data_local_dir()
                .to_path_buf(),
        };
        fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
        Ok(dir)
    }
}

pub const LOG_FILE: &str = "bike-sim.log";

/// Routes `log` output to a file in `dir`, since the terminal is busy
/// drawing. Level comes from `RUST_LOG`, `info` if unset.
pub fn init_logging(dir: &Path) -> Result<()> {
    let path = dir.join(LOG_FILE);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening {}", path.display()))?;
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init();
    Ok(())
}
