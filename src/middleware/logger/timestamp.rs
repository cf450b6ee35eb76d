//! Shared, periodically refreshed timestamp string.
//!
//! Formatting local time on every request is wasted work when the log only
//! shows seconds. One background thread re-formats the clock every
//! [`REFRESH_INTERVAL`] and publishes the string through an [`ArcSwap`];
//! renders read it without locking or allocating. Readers may see a value up
//! to one interval old.

use std::fmt::Write;
use std::sync::{Arc, Weak};
use std::thread;
use std::time::Duration;

use arc_swap::{ArcSwap, Guard};
use chrono::Local;
use chrono::format::{Item, StrftimeItems};
use tracing::{debug, warn};

pub(crate) const REFRESH_INTERVAL: Duration = Duration::from_millis(250);

/// Returns `true` when `chrono` understands every specifier in `layout`.
///
/// Formatting with an unknown specifier makes `Display` fail, so layouts are
/// checked once up front.
pub(crate) fn is_valid_layout(layout: &str) -> bool {
    StrftimeItems::new(layout).all(|item| !matches!(item, Item::Error))
}

fn format_now(layout: &str) -> Option<String> {
    let mut out = String::with_capacity(32);
    write!(out, "{}", Local::now().format(layout)).ok()?;
    Some(out)
}

/// Handle to the shared timestamp. The refresh thread stops once every
/// handle is gone.
pub(crate) struct Timestamp {
    cell: Arc<ArcSwap<String>>,
}

impl Timestamp {
    /// Formats the current time and starts the refresh thread.
    pub(crate) fn start(layout: String) -> Self {
        let initial = format_now(&layout).unwrap_or_default();
        let cell = Arc::new(ArcSwap::from_pointee(initial));

        let weak = Arc::downgrade(&cell);
        let spawned = thread::Builder::new()
            .name("tsu-log-clock".to_owned())
            .spawn(move || refresh(&weak, &layout));

        match spawned {
            Ok(_) => debug!(interval_ms = REFRESH_INTERVAL.as_millis() as u64, "access log clock started"),
            Err(e) => warn!(error = %e, "failed to start access log clock, timestamps will not advance"),
        }

        Self { cell }
    }

    /// The most recently published timestamp.
    pub(crate) fn current(&self) -> Guard<Arc<String>> {
        self.cell.load()
    }
}

fn refresh(cell: &Weak<ArcSwap<String>>, layout: &str) {
    loop {
        thread::sleep(REFRESH_INTERVAL);
        let Some(cell) = cell.upgrade() else { break };
        if let Some(now) = format_now(layout) {
            cell.store(Arc::new(now));
        }
    }
    debug!("access log clock stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_validation() {
        assert!(is_valid_layout("%H:%M:%S"));
        assert!(is_valid_layout("%d/%b/%Y:%H:%M:%S %z"));
        assert!(is_valid_layout("no specifiers at all"));
        assert!(!is_valid_layout("%Q"));
    }

    #[test]
    fn initial_value_is_formatted() {
        let ts = Timestamp::start("%Y".to_owned());
        let year = ts.current();
        assert_eq!(year.len(), 4);
        assert!(year.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn value_advances_in_the_background() {
        let ts = Timestamp::start("%H:%M:%S%.6f".to_owned());
        let before = ts.current().to_string();

        thread::sleep(REFRESH_INTERVAL * 3);

        assert_ne!(ts.current().as_str(), before);
    }
}
