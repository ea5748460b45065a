//! Headless tracker: polls on a schedule and prints notifications.
//!
//! A thin adapter over the library, standing in for a GUI: it subscribes to
//! poll events, logs them, and exposes the one-shot actions (forecast,
//! export, clear) as flags.

use std::path::PathBuf;

use clap::Parser;

use bitforcast::{Bitforcast, ExportOutcome, ForecastModel, PollEvent};

#[derive(Parser, Debug)]
#[command(version, about = "Bitcoin price tracker and forecaster")]
struct Args {
    /// Database file path (defaults to the platform data directory)
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// API key for the quote endpoint
    #[arg(long, env = "BITFORCAST_API_KEY", default_value = "")]
    api_key: String,

    /// Override the quote endpoint URL
    #[arg(long)]
    quote_url: Option<String>,

    /// Poll once and exit instead of running the scheduler
    #[arg(long)]
    once: bool,

    /// Export the stored history to this CSV file and exit
    #[arg(long)]
    export: Option<PathBuf>,

    /// Run a forecast and exit (one of: linear, arima)
    #[arg(long)]
    forecast: Option<String>,

    /// Constant added uniformly to every forecast point
    #[arg(long, default_value = "0.0")]
    bias: f64,

    /// Delete all stored samples and exit (no prompt; be sure)
    #[arg(long)]
    clear: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bitforcast=info".into()),
        )
        .init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> bitforcast::Result<()> {
    let mut builder = Bitforcast::builder().api_key(args.api_key.as_str());
    if let Some(path) = &args.db_path {
        builder = builder.db_path(path);
    }
    if let Some(url) = &args.quote_url {
        builder = builder.quote_url(url.as_str());
    }
    let app = builder.build()?;

    if args.clear {
        app.store().clear_all()?;
        println!("price history cleared");
        return Ok(());
    }

    if let Some(path) = &args.export {
        match app.export_csv(path)? {
            ExportOutcome::Written(rows) => println!("exported {rows} rows to {}", path.display()),
            ExportOutcome::Empty => println!("no data available to export"),
        }
        return Ok(());
    }

    if let Some(model) = &args.forecast {
        let model = match model.as_str() {
            "linear" => ForecastModel::LinearTrend,
            "arima" => ForecastModel::Arima,
            other => {
                eprintln!("unknown model '{other}' (expected: linear, arima)");
                std::process::exit(2);
            }
        };
        let points = app.forecast(model, args.bias)?;
        for (minute, price) in points.iter().enumerate() {
            println!("+{:>2} min  {price:.2}", minute + 1);
        }
        return Ok(());
    }

    app.poller().subscribe(|event| match event {
        PollEvent::Price(update) => {
            println!(
                "{}  {:.2} ({})  avg {:.2}",
                update.sample.timestamp, update.sample.price, update.sample.status, update.average
            );
        }
        PollEvent::Dominance(d) => {
            println!("dominance  BTC {:.2}%  USDT {:.2}%", d.btc, d.usdt);
        }
        PollEvent::Failure(message) => {
            println!("fetch failed: {message}");
        }
    });

    if args.once {
        app.poller().poll_price();
        app.poller().poll_dominance();
        return Ok(());
    }

    let _scheduler = app.start_scheduler();
    println!("{app} polling; Ctrl-C to stop");
    loop {
        std::thread::sleep(std::time::Duration::from_secs(60));
    }
}
