use bike_sim::{app, config::Args};
use clap::Parser;

fn main() -> anyhow::Result<()> {
    app::run(Args::parse())
}
