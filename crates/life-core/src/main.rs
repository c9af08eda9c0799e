use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use life_core::config::{Cli, Command, RunConfig};
use life_core::{runner, LifeError};

fn main() -> Result<(), LifeError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let (config, result) = match cli.command {
        Command::Cpu(args) => {
            let config = RunConfig::from(args);
            let result = runner::run_cpu(&config);
            (config, result)
        }
        Command::Fpga(args) => {
            let (config, device) = args.into_configs();
            let result = runner::run_fpga(&config, &device);
            (config, result)
        }
    };

    #[cfg(feature = "metrics")]
    life_core::summary();

    if let Err(e) = &result {
        error!(error = %e, "run failed");
    }
    runner::finish_trace(&config)?;
    result.map(|_| ())
}
