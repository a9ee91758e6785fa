extern crate chrono;
#[macro_use]
extern crate failure;
extern crate futures;
extern crate reqwest;
#[macro_use]
extern crate serde_derive;
extern crate serde_json;
#[macro_use]
extern crate slog;
extern crate slog_async;
extern crate slog_envlogger;
extern crate slog_scope;
extern crate slog_stdlog;
extern crate slog_term;
extern crate structopt;
extern crate tokio;

use std::env;
use std::io;
use std::path;

use slog::Drain;
use structopt::StructOpt;

pub mod config;
pub mod model;
pub mod poll;
pub mod render;
pub mod schema;
pub mod source;
pub mod status;
pub mod util;

#[derive(Debug, StructOpt)]
#[structopt(name = "plantcare", about = "Watches plant sensors and says when to water.")]
struct Options {
    /// Configuration file; missing files are ignored
    #[structopt(short = "c", long = "config", default_value = "plantcare.toml", parse(from_os_str))]
    config: path::PathBuf,
    /// Realtime database URL, overriding the configuration
    #[structopt(long = "database-url")]
    database_url: Option<String>,
    /// Log filter used when RUST_LOG is not set
    #[structopt(short = "l", long = "log-level", default_value = "info")]
    log_level: String,
    #[structopt(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, StructOpt)]
enum Command {
    /// Poll the database until interrupted (the default)
    #[structopt(name = "watch")]
    Watch {
        /// Print one JSON object per poll instead of text
        #[structopt(long = "json")]
        json: bool,
    },
    /// Poll once, print the result and exit
    #[structopt(name = "check")]
    Check {
        #[structopt(long = "json")]
        json: bool,
    },
    /// Classify a single value without touching the database
    #[structopt(name = "classify")]
    Classify {
        factor: String,
        #[structopt(allow_hyphen_values = true)]
        value: f64,
    },
    /// Print the status reference table
    #[structopt(name = "reference")]
    Reference,
}

fn main() -> Result<(), failure::Error> {
    let options = Options::from_args();

    let log = root_logger(&options.log_level);
    let _scope_guard = slog_scope::set_global_logger(log.clone());
    slog_stdlog::init().map_err(|e| format_err!("could not bridge the log crate: {}", e))?;

    match options.command.unwrap_or(Command::Watch { json: false }) {
        Command::Classify { factor, value } => {
            if factor.parse::<model::Factor>().is_err() {
                warn!(log, "unrecognized factor, defaulting to Normal"; "factor" => &factor);
            }
            println!("{}", status::classify_named(&factor, value));
            Ok(())
        }
        Command::Reference => {
            render::reference(&mut io::stdout().lock(), &status::reference())?;
            Ok(())
        }
        Command::Check { json } => {
            let config = config::Config::load(&options.config, options.database_url.as_deref())?;
            tokio::runtime::Runtime::new()?.block_on(check(log, config, json))
        }
        Command::Watch { json } => {
            let config = config::Config::load(&options.config, options.database_url.as_deref())?;
            tokio::runtime::Runtime::new()?.block_on(watch(log, config, json))
        }
    }
}

fn root_logger(default_filter: &str) -> slog::Logger {
    let filter = env::var("RUST_LOG").unwrap_or_else(|_| default_filter.to_owned());

    let decorator = slog_term::TermDecorator::new().stderr().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_envlogger::LogBuilder::new(drain)
        .parse(&filter)
        .build()
        .ignore_res();
    let drain = slog_async::Async::new(drain).build().fuse();

    slog::Logger::root(drain, o!("version" => env!("CARGO_PKG_VERSION")))
}

async fn watch(log: slog::Logger, config: config::Config, json: bool) -> Result<(), failure::Error> {
    let source = source::RealtimeDb::connect(log.new(o!("component" => "source")), &config.database)?;
    let poller = poll::Poller::new(
        log.new(o!("component" => "poller")),
        source,
        config.poll_interval(),
    );
    let mut dashboard = schema::Dashboard::new(chrono::Utc::now());

    info!(log, "started"; "interval_secs" => config.poll.interval_secs);

    poller
        .run(
            &mut dashboard,
            |dashboard| show(dashboard, json),
            shutdown_signal(log.clone()),
        )
        .await
}

async fn check(log: slog::Logger, config: config::Config, json: bool) -> Result<(), failure::Error> {
    let source = source::RealtimeDb::connect(log.new(o!("component" => "source")), &config.database)?;
    let poller = poll::Poller::new(
        log.new(o!("component" => "poller")),
        source,
        config.poll_interval(),
    );
    let mut dashboard = schema::Dashboard::new(chrono::Utc::now());

    poller.poll_once(&mut dashboard).await?;
    show(&dashboard, json)
}

fn show(dashboard: &schema::Dashboard, json: bool) -> Result<(), failure::Error> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if json {
        render::json(&mut out, dashboard)
    } else {
        render::dashboard(&mut out, dashboard, chrono::Local::now())?;
        Ok(())
    }
}

async fn shutdown_signal(log: slog::Logger) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(log, "could not listen for ctrl-c, running until killed"; "error" => %e);
        futures::future::pending::<()>().await;
    }
    info!(log, "received ctrl-c");
}
