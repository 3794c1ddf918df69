//! The single entry point a scheduler invokes.
use chrono::{DateTime, Local};
use log::{error, info, warn};

use crate::collect::{Collector, Progress};
use crate::config::{Config, Site};
use crate::error::{DirectoryError, PersistenceError};
use crate::fetch::Fetch;
use crate::gate::{GateDecision, Rejection};
use crate::report;
use crate::status::Snapshot;
use crate::store::{RunRecord, Store};

/// How a run ended. A run never fails the caller.
#[derive(Debug)]
pub enum RunOutcome {
    /// Appended to the history; holds the number of stored runs.
    Saved(usize),
    Discarded(Rejection),
    Aborted(DirectoryError),
    PersistFailed(PersistenceError),
}

/// Everything a run needs, compiled once and shared by every scheduled run.
pub struct Job {
    config: Config,
    site: Site,
    store: Store,
}

impl Job {
    pub fn new(config: Config, site: Site, store: Store) -> Job {
        Job {
            config,
            site,
            store,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn site(&self) -> &Site {
        &self.site
    }

    pub fn run_once(&self, fetcher: &dyn Fetch, progress: &mut dyn Progress) -> RunOutcome {
        self.run_at(Local::now(), fetcher, progress)
    }

    /// Collects, reports, gates and persists one run captured at `now`.
    pub fn run_at(
        &self,
        now: DateTime<Local>,
        fetcher: &dyn Fetch,
        progress: &mut dyn Progress,
    ) -> RunOutcome {
        let collector = Collector::new(&self.site, &self.config.priority.high);
        let collection = collector.collect(fetcher, progress);
        let record = RunRecord::new(
            now,
            collection
                .as_ref()
                .map(|collection| collection.snapshot.clone())
                .unwrap_or_else(|_| Snapshot::new()),
        );
        report::print_run(&record);

        let collection = match collection {
            Ok(collection) => collection,
            Err(error) => {
                error!("run {} aborted: {}", record.key(), error);
                report::print_aborted(&error);
                return RunOutcome::Aborted(error);
            }
        };

        if let GateDecision::Reject(rejection) = self.config.gate.evaluate(&record.snapshot) {
            warn!("run {} discarded: {}", record.key(), rejection);
            report::print_discarded(&rejection);
            return RunOutcome::Discarded(rejection);
        }

        let saved = self
            .store
            .save_names(&collection.names)
            .and_then(|_| self.store.append_run(&record));
        match saved {
            Ok(stored) => {
                info!("run {} saved", record.key());
                report::print_saved(stored);
                RunOutcome::Saved(stored)
            }
            Err(error) => {
                error!("run {} lost: {}", record.key(), error);
                report::print_persist_failed(&error);
                RunOutcome::PersistFailed(error)
            }
        }
    }
}
