//! Crawl scheduling
//!
//! Expands a set of jurisdiction codes plus a date span into independent
//! per-window crawl tasks. When no explicit span is given, each court resumes
//! one day after its last recorded progress date, so repeated invocations
//! only ever produce the not-yet-crawled remainder.

use crate::courts::CourtRegistry;
use crate::progress::ProgressRecord;
use crate::Result;
use chrono::{Days, NaiveDate};
use std::fmt;
use uuid::Uuid;

/// An inclusive calendar date range, one atomic crawl unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateWindow {
    /// Creates a window; `None` if the bounds are inverted
    pub fn new(from: NaiveDate, to: NaiveDate) -> Option<Self> {
        (from <= to).then_some(Self { from, to })
    }

    /// Number of calendar days covered (inclusive)
    pub fn days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.from, self.to)
    }
}

/// One unit of crawl work: a court and a date window
///
/// Created once by the scheduler, consumed exactly once by a worker, never
/// mutated.
#[derive(Debug, Clone)]
pub struct CrawlTask {
    pub id: Uuid,
    pub court_code: String,
    pub window: DateWindow,
}

impl CrawlTask {
    fn new(court_code: &str, window: DateWindow) -> Self {
        Self {
            id: Uuid::new_v4(),
            court_code: court_code.to_string(),
            window,
        }
    }
}

impl fmt::Display for CrawlTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} [{}]", self.court_code, self.window, self.id)
    }
}

/// Expands court codes and date spans into crawl tasks
pub struct CrawlScheduler<'a> {
    registry: &'a CourtRegistry,
    /// First date ever crawled for a court with no progress record
    epoch_start: NaiveDate,
    /// Upper bound for open-ended spans; injected so tests control the clock
    today: NaiveDate,
}

impl<'a> CrawlScheduler<'a> {
    pub fn new(registry: &'a CourtRegistry, epoch_start: NaiveDate, today: NaiveDate) -> Self {
        Self {
            registry,
            epoch_start,
            today,
        }
    }

    /// Expands codes into ordered, per-court-contiguous window tasks
    ///
    /// Every code is validated against the registry before any task is
    /// produced, so an unknown code rejects the whole run. The start date is
    /// the explicit one if given, else one day past the court's recorded
    /// progress, else the epoch start; the end is the explicit one, else
    /// "today". A court already past the end date yields no tasks.
    pub fn expand(
        &self,
        codes: &[String],
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        step_days: u32,
        progress: &ProgressRecord,
    ) -> Result<Vec<CrawlTask>> {
        for code in codes {
            self.registry.resolve(code)?;
        }

        let step = step_days.max(1) as u64;
        let end = end.unwrap_or(self.today);
        let mut tasks = Vec::new();

        for code in codes {
            let start = match start {
                Some(explicit) => explicit,
                None => match progress.last_date(code) {
                    Some(last) => match last.checked_add_days(Days::new(1)) {
                        Some(next) => next,
                        None => continue,
                    },
                    None => self.epoch_start,
                },
            };

            if start > end {
                tracing::info!("Court {} already crawled through {}", code, end);
                continue;
            }

            let mut cursor = start;
            while cursor <= end {
                let window_end = cursor
                    .checked_add_days(Days::new(step - 1))
                    .map(|d| d.min(end))
                    .unwrap_or(end);
                if let Some(window) = DateWindow::new(cursor, window_end) {
                    tasks.push(CrawlTask::new(code, window));
                }
                cursor = match window_end.checked_add_days(Days::new(1)) {
                    Some(next) => next,
                    None => break,
                };
            }
        }

        Ok(tasks)
    }
}
