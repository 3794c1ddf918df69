//! One full collection pass: directory, ordering, per-lot classification.
use std::collections::BTreeSet;

use log::{info, warn};

use crate::classifier::Classifier;
use crate::config::Site;
use crate::directory::DirectoryResolver;
use crate::error::DirectoryError;
use crate::fetch::Fetch;
use crate::priority::prioritize;
use crate::status::{LotId, NameDirectory, Snapshot, StatusCategory};

/// Progress sink for a collection pass.
pub trait Progress {
    fn begin(&mut self, _total: usize) {}
    fn lot_done(&mut self, _index: usize, _id: &LotId, _category: &StatusCategory) {}
}

/// A no-op progress sink.
pub struct NullProgress;
impl Progress for NullProgress {}

/// Result of a completed pass.
#[derive(Debug, Clone)]
pub struct Collection {
    pub snapshot: Snapshot,
    pub names: NameDirectory,
    /// Ids in the order they were visited.
    pub order: Vec<LotId>,
}

pub struct Collector<'a> {
    site: &'a Site,
    high_priority: &'a BTreeSet<LotId>,
}

impl<'a> Collector<'a> {
    pub fn new(site: &'a Site, high_priority: &'a BTreeSet<LotId>) -> Self {
        Collector {
            site,
            high_priority,
        }
    }

    /// Visits every discovered lot exactly once, strictly one after another. A lot
    /// that cannot be classified is recorded as unknown; only a directory failure
    /// aborts the pass.
    pub fn collect(
        &self,
        fetcher: &dyn Fetch,
        progress: &mut dyn Progress,
    ) -> Result<Collection, DirectoryError> {
        let names = DirectoryResolver::new(self.site).resolve(fetcher)?;
        let order = prioritize(names.keys(), self.high_priority);
        let classifier = Classifier::new(self.site);

        progress.begin(order.len());
        let mut snapshot = Snapshot::new();
        let mut failures = 0;
        for (index, id) in order.iter().enumerate() {
            let category = match classifier.classify(fetcher, id) {
                Ok(category) => category,
                Err(error) => {
                    warn!("{}", error);
                    failures += 1;
                    StatusCategory::Unknown
                }
            };
            progress.lot_done(index, id, &category);
            snapshot.record(id.clone(), category);
        }
        info!(
            "classified {} lots, {} unavailable",
            snapshot.len(),
            failures
        );

        Ok(Collection {
            snapshot,
            names,
            order,
        })
    }
}
