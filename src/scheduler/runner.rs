//! Scheduler background loop.
//!
//! Spawns a tokio task that periodically checks for due jobs and emits
//! their [`JobKind`] on a channel. The scheduler never touches tracking
//! state; the runtime that owns the store executes the jobs.

use crate::config::ScheduleConfig;
use crate::scheduler::tasks::{JobKind, Schedule, ScheduledJob, now_epoch_secs};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Default interval between scheduler ticks (seconds).
const DEFAULT_TICK_INTERVAL_SECS: u64 = 30;

/// Background scheduler for the bot's periodic jobs.
pub struct Scheduler {
    /// Registered jobs.
    jobs: Vec<ScheduledJob>,
    /// Channel the due jobs are sent on.
    job_tx: mpsc::UnboundedSender<JobKind>,
    /// Local UTC offset for daily slots, in seconds.
    offset_secs: i32,
    tick_interval: Duration,
}

impl Scheduler {
    /// Create an empty scheduler.
    pub fn new(job_tx: mpsc::UnboundedSender<JobKind>, offset_secs: i32) -> Self {
        Self {
            jobs: Vec::new(),
            job_tx,
            offset_secs,
            tick_interval: Duration::from_secs(DEFAULT_TICK_INTERVAL_SECS),
        }
    }

    /// Override how often due jobs are checked.
    #[must_use]
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Scheduler with the bot's four jobs registered from `config`.
    ///
    /// Daily jobs are armed at `now`, so a slot that already passed today
    /// waits until tomorrow. Interval jobs run on the first tick.
    pub fn from_config(
        config: &ScheduleConfig,
        job_tx: mpsc::UnboundedSender<JobKind>,
        now: u64,
    ) -> Self {
        let mut scheduler = Self::new(job_tx, config.offset().local_minus_utc())
            .with_tick_interval(Duration::from_secs(config.tick_interval_secs.max(1)));

        scheduler.add_job(ScheduledJob::new(
            JobKind::GeneralSweep,
            Schedule::Interval {
                secs: config.check_interval_secs,
            },
        ));
        scheduler.add_job(ScheduledJob::new(
            JobKind::ProgressSweep,
            Schedule::Interval {
                secs: config.progress_interval_secs(),
            },
        ));

        let mut reset = ScheduledJob::new(
            JobKind::DailyReset,
            Schedule::Daily {
                hour: config.reset_hour,
                min: config.reset_min,
            },
        );
        reset.mark_run_at(now);
        scheduler.add_job(reset);

        let mut nudge = ScheduledJob::new(
            JobKind::MorningNudge,
            Schedule::Daily {
                hour: config.start_hour,
                min: 0,
            },
        );
        nudge.mark_run_at(now);
        scheduler.add_job(nudge);

        scheduler
    }

    /// Add (or replace) the job of the same kind.
    pub fn add_job(&mut self, job: ScheduledJob) {
        if let Some(existing) = self.jobs.iter_mut().find(|j| j.kind == job.kind) {
            *existing = job;
        } else {
            self.jobs.push(job);
        }
    }

    /// Returns registered jobs.
    pub fn jobs(&self) -> &[ScheduledJob] {
        &self.jobs
    }

    /// Mark every job due at `now` as run and return their kinds.
    pub fn tick_at(&mut self, now: u64) -> Vec<JobKind> {
        let offset = self.offset_secs;
        let mut due = Vec::new();
        for job in &mut self.jobs {
            if job.is_due_at(now, offset) {
                job.mark_run_at(now);
                due.push(job.kind);
            }
        }
        due
    }

    /// Start the scheduler background loop.
    ///
    /// The loop ends when the receiving side of the job channel is dropped.
    pub fn run(mut self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            for job in &self.jobs {
                info!(job = %job.kind, schedule = %job.schedule, "job registered");
            }
            let mut interval = tokio::time::interval(self.tick_interval);

            loop {
                interval.tick().await;
                for kind in self.tick_at(now_epoch_secs()) {
                    debug!(job = %kind, "job due");
                    if self.job_tx.send(kind).is_err() {
                        info!("job receiver dropped, scheduler stopping");
                        return;
                    }
                }
            }
        })
    }
}
