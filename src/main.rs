extern crate parkwatch;
use clap::{App, Arg, ArgMatches, SubCommand};
use log::{debug, error, info};
use parkwatch::classifier::Classifier;
use parkwatch::collect::Progress;
use parkwatch::config::Config;
use parkwatch::directory::DirectoryResolver;
use parkwatch::error::ConfigError;
use parkwatch::fetch::HttpFetcher;
use parkwatch::report;
use parkwatch::schedule::{Schedule, Scheduler};
use parkwatch::status::{LotId, StatusCategory};
use parkwatch::store::Store;
use parkwatch::{Job, RunOutcome};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

/// Logs every lot at debug level and a heartbeat every ten lots.
struct LogProgress {
    total: usize,
}

impl Progress for LogProgress {
    fn begin(&mut self, total: usize) {
        self.total = total;
        info!("classifying {} lots", total);
    }

    fn lot_done(&mut self, index: usize, id: &LotId, category: &StatusCategory) {
        debug!("[{}/{}] lot {}: {}", index + 1, self.total, id, category);
        if (index + 1) % 10 == 0 {
            info!("{}/{} lots classified", index + 1, self.total);
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = App::new("parkwatch")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Records the occupancy status of every parking lot on a fixed schedule")
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("FILE")
                .help("JSON configuration file"),
        )
        .arg(
            Arg::with_name("records")
                .long("records")
                .value_name("FILE")
                .help("Run history file"),
        )
        .arg(
            Arg::with_name("names")
                .long("names")
                .value_name("FILE")
                .help("Lot name directory file"),
        )
        .subcommand(
            SubCommand::with_name("watch").about("Runs at every scheduled minute (default)"),
        )
        .subcommand(SubCommand::with_name("once").about("Runs a single collection and exits"))
        .subcommand(SubCommand::with_name("names").about("Prints and saves the lot directory"))
        .subcommand(
            SubCommand::with_name("status")
                .about("Prints the current status of one lot")
                .arg(Arg::with_name("ID").required(true)),
        )
        .get_matches();

    let config = match load_config(&matches) {
        Ok(config) => config,
        Err(error) => {
            error!("{}", error);
            process::exit(1);
        }
    };

    let code = match run(config, &matches) {
        Ok(code) => code,
        Err(error) => {
            error!("{}", error);
            1
        }
    };
    process::exit(code);
}

fn load_config(matches: &ArgMatches) -> Result<Config, ConfigError> {
    let mut config = match matches.value_of("config") {
        Some(path) => Config::load(Path::new(path))?,
        None => Config::default(),
    };
    if let Some(path) = matches.value_of("records") {
        config.store.records_path = PathBuf::from(path);
    }
    if let Some(path) = matches.value_of("names") {
        config.store.names_path = PathBuf::from(path);
    }
    config.validate()?;
    Ok(config)
}

fn run(config: Config, matches: &ArgMatches) -> Result<i32, ConfigError> {
    let site = config.site.compile()?;
    let fetcher = HttpFetcher::new(&config.site.user_agent, config.site.timeout())?;
    let schedule = Schedule::new(&config.schedule.minutes)?;
    let store = Store::new(&config.store);
    let job = Job::new(config, site, store);

    match matches.subcommand() {
        ("once", _) => match job.run_once(&fetcher, &mut LogProgress { total: 0 }) {
            RunOutcome::Saved(_) | RunOutcome::Discarded(_) => Ok(0),
            RunOutcome::Aborted(_) | RunOutcome::PersistFailed(_) => Ok(1),
        },
        ("names", _) => Ok(names(&job, &fetcher)),
        ("status", Some(sub)) => {
            let id = LotId::from(sub.value_of("ID").unwrap_or_default());
            Ok(status(&job, &fetcher, &id))
        }
        _ => {
            info!(
                "scheduling runs at minutes {:?} past every hour",
                schedule.minutes().collect::<Vec<_>>()
            );
            let scheduler = Scheduler::new(schedule);
            let job = Arc::new(job);
            let fetcher = Arc::new(fetcher);
            scheduler.run(move || {
                job.run_once(&*fetcher, &mut LogProgress { total: 0 });
            })
        }
    }
}

fn names(job: &Job, fetcher: &HttpFetcher) -> i32 {
    let names = match DirectoryResolver::new(job.site()).resolve(fetcher) {
        Ok(names) => names,
        Err(error) => {
            error!("{}", error);
            return 1;
        }
    };
    report::print_names(&names);
    match job.store().save_names(&names) {
        Ok(()) => 0,
        Err(error) => {
            error!("{}", error);
            1
        }
    }
}

fn status(job: &Job, fetcher: &HttpFetcher, id: &LotId) -> i32 {
    match Classifier::new(job.site()).classify(fetcher, id) {
        Ok(category) => {
            println!("{}: {}", id, category);
            0
        }
        Err(error) => {
            error!("{}", error);
            1
        }
    }
}
