use aurora_watch::context::Context;
use aurora_watch::coord::{Coordinate, LongitudeConvention};
use aurora_watch::error::Error;
use aurora_watch::notify::Formatter;
use aurora_watch::poller::{Config, Poller};
use aurora_watch::swpc::{Client, Lookup, DEFAULT_ENDPOINT};
use clap::{ArgAction, Parser};
use std::io::IsTerminal;
use std::process::ExitCode;
use std::time::Duration;
use tracing::Level;

/// Checks NOAA for aurora predictions and alerts you when the prediction changes.
#[derive(Debug, Parser)]
#[clap(name = "aurora-watch", version)]
struct Args {
    /// Latitude to watch, cardinal (58S) or decimal (-58)
    #[clap(allow_negative_numbers = true)]
    latitude: String,

    /// Longitude to watch, cardinal (40W) or decimal (-40)
    #[clap(allow_negative_numbers = true)]
    longitude: String,

    /// Report every forecast update, even when your area's chances haven't changed
    #[clap(short = 'g', long, visible_alias = "notifyglobal")]
    notify_global: bool,

    /// Only report probabilities at or above this percentage
    #[clap(short, long, value_parser = clap::value_parser!(u8).range(0..=100))]
    threshold: Option<u8>,

    /// Seconds between requests to NOAA
    #[clap(short, long, default_value_t = 90, value_parser = clap::value_parser!(u64).range(1..))]
    interval: u64,

    /// Only print updates to your location's probability
    #[clap(short, long)]
    quiet: bool,

    /// Print a running graph of your location's probability
    #[clap(long)]
    graph: bool,

    /// How to find your location in the forecast grid
    #[clap(long, value_enum, default_value_t = Lookup::Index)]
    lookup: Lookup,

    /// Times to retry a failed request before giving up
    #[clap(long, default_value_t = 0)]
    retries: u32,

    /// Label positive longitudes E and negative ones W
    #[clap(long)]
    standard_longitude: bool,

    #[clap(long, default_value_t = String::from(DEFAULT_ENDPOINT), hide = true)]
    endpoint: String,

    /// More log output on stderr; repeat for more
    #[clap(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn to_config(&self, location: Coordinate) -> Config {
        Config {
            lookup: self.lookup,
            notify_global: self.notify_global,
            threshold: self.threshold,
            interval: Duration::from_secs(self.interval),
            quiet: self.quiet,
            graph: self.graph,
            retries: self.retries,
            longitude_convention: if self.standard_longitude {
                LongitudeConvention::Standard
            } else {
                LongitudeConvention::Feed
            },
            endpoint: self.endpoint.clone(),
            ..Config::new(location)
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", Formatter::new(std::io::stderr().is_terminal()).bold(&e.to_string()));
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Error> {
    let location = Coordinate::parse(&args.latitude, &args.longitude)?;
    let config = args.to_config(location);

    let ctx = Context::new();
    {
        let ctx = ctx.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            tracing::info!("got SIGINT, stopping");
            ctx.cancel();
        }) {
            tracing::warn!("could not set SIGINT handler: {}", e);
        }
    }

    let client = Client::new(&config.user_agent, &config.endpoint);
    tracing::debug!("polling {}", client.endpoint());

    let stdout = std::io::stdout();
    let fmt = Formatter::new(stdout.is_terminal());
    Poller::new(config, client, stdout, fmt).run(&ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("aurora-watch").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn defaults() {
        let args = parse(&["58N", "40W"]);
        let config = args.to_config(Coordinate::parse(&args.latitude, &args.longitude).unwrap());
        assert_eq!(config.interval, Duration::from_secs(90));
        assert_eq!(config.threshold, None);
        assert_eq!(config.lookup, Lookup::Index);
        assert_eq!(config.retries, 0);
        assert_eq!(config.longitude_convention, LongitudeConvention::Feed);
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert!(!config.quiet && !config.notify_global && !config.graph);
    }

    #[test]
    fn accepts_negative_decimal_positionals() {
        let args = parse(&["-58", "-40", "-q", "-t", "50", "-i", "30", "--lookup", "nearest"]);
        assert_eq!(args.latitude, "-58");
        assert_eq!(args.longitude, "-40");
        assert!(args.quiet);
        assert_eq!(args.threshold, Some(50));
        assert_eq!(args.interval, 30);
        assert_eq!(args.lookup, Lookup::Nearest);
    }

    #[test]
    fn rejects_threshold_above_100() {
        let argv = ["aurora-watch", "0", "0", "--threshold", "101"];
        assert!(Args::try_parse_from(argv).is_err());
    }

    #[test]
    fn args_are_well_formed() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
