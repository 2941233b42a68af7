use clap::Parser;
use log::error;

mod args;
mod extract;

fn main() {
    let parsed = args::Args::parse();
    if parsed.verbose {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::init();
    }

    match extract::run_extraction(&parsed) {
        Ok(()) => {}
        Err(err) => {
            error!("{}", err);
            eprintln!("Error: {}", err);
            std::process::exit(1);
        }
    }
}
