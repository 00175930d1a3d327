//! Periodic scheduler.
//!
//! A recurring-timer primitive, not a task queue.  Each entry carries a
//! period, the time it last fired, an enabled flag and the [`Job`] it
//! stands for.  The owner polls entries on its own terms and runs the job
//! itself when the scheduler reports it due, so a job only ever borrows
//! the state it needs at that moment.
//!
//! ```text
//!   now - last_fired >= period  &&  enabled
//!          │
//!          ▼
//!   last_fired = now   ──▶  owner runs the Job (synchronously)
//! ```
//!
//! Periods are lower bounds: an entry polled late fires late, and the
//! next period counts from the late firing.

use log::{debug, info};

// ═══════════════════════════════════════════════════════════════
//  Schedule types
// ═══════════════════════════════════════════════════════════════

/// The recurring jobs of the node.  One entry each, created at boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    /// Connectivity check, registration, telemetry/settings dispatch.
    Supervisor,
    /// Read the sensor and upload both channels.
    Telemetry,
    /// Fetch remote settings.
    SettingsSync,
    /// Retry the managed-network join while provisioning.
    Reconnect,
}

impl Job {
    pub fn label(self) -> &'static str {
        match self {
            Self::Supervisor => "supervisor",
            Self::Telemetry => "telemetry",
            Self::SettingsSync => "settings-sync",
            Self::Reconnect => "reconnect",
        }
    }
}

/// A single schedule entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleEntry {
    pub job: Job,
    pub period_ms: u64,
    pub last_fired_ms: u64,
    pub enabled: bool,
}

impl ScheduleEntry {
    fn is_due(&self, now_ms: u64) -> bool {
        self.enabled && now_ms.saturating_sub(self.last_fired_ms) >= self.period_ms
    }
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

/// Maximum number of schedule entries (stack-allocated).
const MAX_SCHEDULES: usize = 4;

/// The scheduler engine.
///
/// Entries are never removed; they are only paused and resumed.
pub struct Scheduler {
    entries: heapless::Vec<ScheduleEntry, MAX_SCHEDULES>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            entries: heapless::Vec::new(),
        }
    }

    /// Add a disabled entry for `job`.  Returns `false` if the table is
    /// full or the job already has an entry.
    pub fn add(&mut self, job: Job, period_ms: u64) -> bool {
        if self.entry(job).is_some() {
            return false;
        }
        let entry = ScheduleEntry {
            job,
            period_ms,
            last_fired_ms: 0,
            enabled: false,
        };
        if self.entries.push(entry).is_err() {
            return false;
        }
        info!("Scheduler: added '{}' every {} ms", job.label(), period_ms);
        true
    }

    /// Prime `last_fired = now` and enable.  The first firing is one full
    /// period away.
    pub fn start(&mut self, job: Job, now_ms: u64) {
        if let Some(e) = self.entry_mut(job) {
            e.last_fired_ms = now_ms;
            e.enabled = true;
            debug!("Scheduler: '{}' started at {} ms", job.label(), now_ms);
        }
    }

    /// Disable without touching `last_fired`.
    pub fn pause(&mut self, job: Job) {
        if let Some(e) = self.entry_mut(job) {
            e.enabled = false;
        }
    }

    /// Re-enable without touching `last_fired`.
    pub fn resume(&mut self, job: Job) {
        if let Some(e) = self.entry_mut(job) {
            e.enabled = true;
        }
    }

    /// Check-and-fire.  Returns `true` (and records the firing) when the
    /// entry is enabled and due; the caller then runs the job.
    pub fn poll(&mut self, job: Job, now_ms: u64) -> bool {
        match self.entry_mut(job) {
            Some(e) if e.is_due(now_ms) => {
                e.last_fired_ms = now_ms;
                debug!("Scheduler: '{}' fired at {} ms", job.label(), now_ms);
                true
            }
            _ => false,
        }
    }

    pub fn is_enabled(&self, job: Job) -> bool {
        self.entry(job).is_some_and(|e| e.enabled)
    }

    pub fn entry(&self, job: Job) -> Option<&ScheduleEntry> {
        self.entries.iter().find(|e| e.job == job)
    }

    /// Number of enabled entries.
    pub fn active_count(&self) -> usize {
        self.entries.iter().filter(|e| e.enabled).count()
    }

    fn entry_mut(&mut self, job: Job) -> Option<&mut ScheduleEntry> {
        self.entries.iter_mut().find(|e| e.job == job)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
