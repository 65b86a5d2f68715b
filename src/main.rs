use clap::Parser;
use grade::{config::Cli, run};
use tracing::{metadata::LevelFilter, Level};
use tracing_subscriber::{fmt, prelude::*, util::SubscriberInitExt};

fn init_logging(cli: &Cli) {
    let level = match (cli.debug, cli.quiet) {
        (true, _) => Level::DEBUG,
        (false, 0) => Level::INFO,
        (false, 1) => Level::WARN,
        (false, _) => Level::ERROR,
    };
    let fmt = fmt::layer()
        .with_writer(std::io::stderr)
        .without_time()
        .with_file(false)
        .with_line_number(false);
    tracing_subscriber::registry()
        .with(fmt)
        .with(LevelFilter::from_level(level))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);
    if let Some(color) = &cli.color {
        colored::control::set_override(color == "on");
    }

    match run(&cli.into_config()) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}
