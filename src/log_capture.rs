//! Test logger that keeps every record, tagged with the thread that
//! logged it, so tests running in parallel only see their own lines.

use std::sync::{Mutex, Once};
use std::thread::{self, ThreadId};

use log::{Level, LevelFilter, Log, Metadata, Record};

struct Capture;

static RECORDS: Mutex<Vec<(ThreadId, Level, String)>> = Mutex::new(Vec::new());
static INSTALL: Once = Once::new();

impl Log for Capture {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        if let Ok(mut records) = RECORDS.lock() {
            records.push((thread::current().id(), record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

/// Install the capturing logger at trace level; later calls are no-ops.
pub fn install() {
    INSTALL.call_once(|| {
        let _ = log::set_logger(&Capture);
        log::set_max_level(LevelFilter::Trace);
    });
}

/// Drain the records logged so far by the calling thread.
pub fn take() -> Vec<(Level, String)> {
    let me = thread::current().id();
    let mut records = RECORDS.lock().unwrap();
    let (mine, rest): (Vec<_>, Vec<_>) = records.drain(..).partition(|(t, _, _)| *t == me);
    *records = rest;
    mine.into_iter().map(|(_, level, line)| (level, line)).collect()
}

/// Lines the calling thread logged at `warn!`, drained.
pub fn warnings() -> Vec<String> {
    take()
        .into_iter()
        .filter(|(level, _)| *level == Level::Warn)
        .map(|(_, line)| line)
        .collect()
}
