use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use shore::cli::orchestration::dispatch;
use shore::cli::Cli;
use shore::config::load_config;
use shore::ui;
use shore::ShoreError;
use std::process::ExitCode;

fn init_tracing(verbose: u8) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose >= 2)
                .without_time(),
        )
        .init();
}

fn run(mut cli: Cli) -> anyhow::Result<i32> {
    let cwd = std::env::current_dir()?;
    cli.absolutize_paths(&cwd);
    if let Some(directory) = &cli.change_directory {
        std::env::set_current_dir(directory)
            .map_err(|e| anyhow::anyhow!("cannot change directory to {}: {}", directory.display(), e))?;
    }

    let config = load_config(cli.config.as_deref())?;
    let mut stdout = std::io::stdout().lock();
    Ok(dispatch(cli.command, &config, &mut stdout)?)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            if let Some(ShoreError::Usage(message)) = e.downcast_ref::<ShoreError>() {
                Cli::command().error(ErrorKind::ArgumentConflict, message).exit();
            }
            ui::display_error(&format!("{:#}", e));
            ExitCode::from(1)
        }
    }
}
