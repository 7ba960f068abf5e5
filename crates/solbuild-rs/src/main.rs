//! `solbuild` binary: resolve and print the build's compiler configuration.

use clap::Parser;
use log::debug;
use solbuild_rs::{Cli, run};

fn main() -> anyhow::Result<()> {
    let _ = env_logger::builder()
        .format_timestamp_millis()
        .parse_default_env()
        .try_init();

    let cli = Cli::parse();
    debug!("running {:?}", cli.command);
    let output = run(&cli)?;
    println!("{output}");
    Ok(())
}
