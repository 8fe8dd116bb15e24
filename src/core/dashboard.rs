//! Reporting dashboard - aggregate statistics over blades and sharpenings

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate};
use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

use crate::core::identity::EntityId;
use crate::core::store::{DocumentStore, StoreError};
use crate::entities::{Blade, Branch, SharpeningEvent, SharpeningKind};

/// Number of months in the trailing histogram, current month included
pub const HISTORY_MONTHS: u32 = 6;

#[derive(Debug, Error, Diagnostic)]
pub enum ReportError {
    #[error("Operation failed, please try again")]
    #[diagnostic(code(sawtrack::report::collaborator))]
    Collaborator { cause: StoreError },

    #[error("failed to render the report: {0}")]
    #[diagnostic(code(sawtrack::report::template))]
    Template(String),

    #[error("failed to write CSV: {0}")]
    #[diagnostic(code(sawtrack::report::csv))]
    Csv(String),

    #[error("failed to write {path}: {source}")]
    #[diagnostic(code(sawtrack::report::io))]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Headline counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total_blades: usize,
    pub terminal_blades: usize,
    pub open_blades: usize,
    pub total_events: usize,
    pub total_branches: usize,
}

/// One month of the trailing histogram
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthBucket {
    pub year: i32,
    pub month: u32,
    /// "<Month name> <year>"
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KindCount {
    pub kind: SharpeningKind,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchCount {
    pub branch: EntityId,
    pub name: String,
    pub count: usize,
}

/// Everything the dashboard shows, computed from one fetch of each collection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub generated_on: NaiveDate,
    pub summary: Summary,
    pub monthly: Vec<MonthBucket>,
    pub by_kind: Vec<KindCount>,
    pub by_branch: Vec<BranchCount>,
}

impl Dashboard {
    /// Fetch blades, events and branches once and aggregate them
    ///
    /// `now` fixes both the report date and the zone events are bucketed in.
    pub fn load<S: DocumentStore>(store: &S, now: DateTime<FixedOffset>) -> Result<Self, ReportError> {
        let blades: Vec<Blade> = store.fetch_all().map_err(collaborator)?;
        let events: Vec<SharpeningEvent> = store.fetch_all().map_err(collaborator)?;
        let branches: Vec<Branch> = store.fetch_all().map_err(collaborator)?;
        debug!(
            blades = blades.len(),
            events = events.len(),
            branches = branches.len(),
            "computing dashboard"
        );
        Ok(Self::compute(&blades, &events, &branches, now))
    }

    pub fn compute(
        blades: &[Blade],
        events: &[SharpeningEvent],
        branches: &[Branch],
        now: DateTime<FixedOffset>,
    ) -> Self {
        let today = now.date_naive();
        let terminal = blades.iter().filter(|b| b.is_terminal()).count();
        let summary = Summary {
            total_blades: blades.len(),
            terminal_blades: terminal,
            open_blades: blades.len() - terminal,
            total_events: events.len(),
            total_branches: branches.len(),
        };

        Self {
            generated_on: today,
            summary,
            monthly: monthly_histogram(events, now),
            by_kind: count_by_kind(events),
            by_branch: count_by_branch(events, branches),
        }
    }

    /// Date stamp used in export file names
    pub fn date_stamp(&self) -> String {
        self.generated_on.format("%Y-%m-%d").to_string()
    }
}

fn collaborator(cause: StoreError) -> ReportError {
    error!(error = %cause, "document store call failed");
    ReportError::Collaborator { cause }
}

/// (year, month) that lies `back` months before the month of `today`
fn month_before(today: NaiveDate, back: u32) -> (i32, u32) {
    let index = today.year() * 12 + today.month0() as i32 - back as i32;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

fn month_label(year: i32, month: u32) -> String {
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|d| d.format("%B %Y").to_string())
        .unwrap_or_else(|| format!("{}-{:02}", year, month))
}

fn monthly_histogram(events: &[SharpeningEvent], now: DateTime<FixedOffset>) -> Vec<MonthBucket> {
    let zone = now.timezone();
    let today = now.date_naive();
    let mut counts: BTreeMap<(i32, u32), usize> = BTreeMap::new();
    for event in events {
        let local = event.timestamp.with_timezone(&zone);
        let key = (local.year(), local.month());
        *counts.entry(key).or_insert(0) += 1;
    }

    (0..HISTORY_MONTHS)
        .rev()
        .map(|back| {
            let (year, month) = month_before(today, back);
            MonthBucket {
                year,
                month,
                label: month_label(year, month),
                count: counts.get(&(year, month)).copied().unwrap_or(0),
            }
        })
        .collect()
}

fn count_by_kind(events: &[SharpeningEvent]) -> Vec<KindCount> {
    let mut counts: BTreeMap<SharpeningKind, usize> = BTreeMap::new();
    for event in events {
        *counts.entry(event.kind).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(kind, count)| KindCount { kind, count })
        .collect()
}

fn count_by_branch(events: &[SharpeningEvent], branches: &[Branch]) -> Vec<BranchCount> {
    branches
        .iter()
        .map(|branch| BranchCount {
            branch: branch.id,
            name: branch.name.clone(),
            count: events.iter().filter(|e| e.branch == branch.id).count(),
        })
        .collect()
}
