#![deny(clippy::pedantic, clippy::all, clippy::nursery)]

use clap::Parser;
use geoip_transport_map::{
    config::{Cli, Settings},
    controller::Controller,
    logging,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init()?;

    let settings = Settings::load(Cli::parse())?;
    let controller = Controller::init(&settings)?;

    controller.run().await
}
