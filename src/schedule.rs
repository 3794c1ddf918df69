//! Wall-clock trigger for collection runs.
//!
//! Runs execute on a single worker thread. A trigger that fires while the previous
//! run is still going is skipped, so two runs never write the store at once.
use std::cmp;
use std::collections::BTreeSet;
use std::thread;

use chrono::{DateTime, Duration, Local, TimeZone, Timelike};
use log::{info, warn};
use threadpool::ThreadPool;

use crate::error::ConfigError;

/// Minute marks past each hour at which runs start.
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    minutes: BTreeSet<u32>,
}

impl Schedule {
    pub fn new(minutes: &[u32]) -> Result<Schedule, ConfigError> {
        if let Some(minute) = minutes.iter().find(|minute| **minute > 59) {
            return Err(ConfigError::Minute(*minute));
        }
        if minutes.is_empty() {
            return Err(ConfigError::EmptySchedule);
        }
        Ok(Schedule {
            minutes: minutes.iter().cloned().collect(),
        })
    }

    pub fn minutes(&self) -> impl Iterator<Item = u32> + '_ {
        self.minutes.iter().cloned()
    }

    /// First whole minute strictly after `now` whose minute mark is scheduled.
    pub fn next_after<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> DateTime<Tz> {
        let floor = now.clone()
            - Duration::seconds(i64::from(now.second()))
            - Duration::nanoseconds(i64::from(now.nanosecond()));
        (1..=60)
            .map(|step| floor.clone() + Duration::minutes(step))
            .find(|candidate| self.minutes.contains(&candidate.minute()))
            .unwrap_or_else(|| floor + Duration::hours(1))
    }
}

pub struct Scheduler {
    schedule: Schedule,
    pool: ThreadPool,
}

impl Scheduler {
    pub fn new(schedule: Schedule) -> Scheduler {
        Scheduler {
            schedule,
            pool: ThreadPool::with_name(String::from("collection-run"), 1),
        }
    }

    /// Hands `job` to the worker unless a run is still active or queued.
    pub fn trigger<F>(&self, job: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        if self.pool.active_count() + self.pool.queued_count() > 0 {
            warn!("previous run still in progress, skipping this trigger");
            return false;
        }
        self.pool.execute(job);
        true
    }

    /// Sleeps until each scheduled minute and triggers `job`. Never returns.
    pub fn run<F>(&self, job: F) -> !
    where
        F: Fn() + Clone + Send + 'static,
    {
        let mut after = Local::now();
        loop {
            let next = self.schedule.next_after(&after);
            info!("next run at {}", next.format("%H:%M"));
            let wait = next.clone() - Local::now();
            if let Ok(wait) = wait.to_std() {
                thread::sleep(wait);
            }
            self.trigger(job.clone());
            after = cmp::max(next, Local::now());
        }
    }

    /// Blocks until the current run, if any, has finished.
    pub fn join(&self) {
        self.pool.join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, FixedOffset};
    use matches::assert_matches;
    use std::sync::mpsc;

    fn at(h: u32, m: u32, s: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(3 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 10, 16, h, m, s)
            .unwrap()
    }

    #[test]
    fn test_next_half_hour() {
        let schedule = Schedule::new(&[0, 30]).unwrap();

        assert_eq!(at(14, 30, 0), schedule.next_after(&at(14, 7, 12)));
        assert_eq!(at(15, 0, 0), schedule.next_after(&at(14, 30, 0)));
        assert_eq!(at(15, 0, 0), schedule.next_after(&at(14, 59, 59)));
    }

    #[test]
    fn test_next_crosses_midnight() {
        let schedule = Schedule::new(&[15]).unwrap();

        let next = schedule.next_after(&at(23, 20, 0));

        assert_eq!(0, next.hour());
        assert_eq!(15, next.minute());
        assert_eq!(17, next.day());
    }

    #[test]
    fn test_invalid_schedules() {
        assert_matches!(Schedule::new(&[]), Err(ConfigError::EmptySchedule));
        assert_matches!(Schedule::new(&[0, 75]), Err(ConfigError::Minute(75)));
    }

    #[test]
    fn test_busy_worker_skips_trigger() {
        let scheduler = Scheduler::new(Schedule::new(&[0]).unwrap());
        let (release, wait) = mpsc::channel::<()>();
        let (started_tx, started) = mpsc::channel::<()>();

        assert!(scheduler.trigger(move || {
            started_tx.send(()).unwrap();
            wait.recv().unwrap();
        }));
        started.recv().unwrap();
        assert!(!scheduler.trigger(|| {}));

        release.send(()).unwrap();
        scheduler.join();
        assert!(scheduler.trigger(|| {}));
        scheduler.join();
    }
}
