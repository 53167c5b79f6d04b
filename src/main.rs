//! tabclean - Command-line entry point

use clap::Parser;
use tabclean::cli::{cmd_clean, cmd_info, Cli, Commands};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tabclean=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Clean {
            data,
            config,
            output,
            report,
            drop_constant,
            max_cardinality,
        } => {
            cmd_clean(
                &data,
                config.as_ref(),
                &output,
                report.as_ref(),
                drop_constant,
                max_cardinality,
            )?;
        }
        Commands::Info { data } => {
            cmd_info(&data)?;
        }
    }

    Ok(())
}
