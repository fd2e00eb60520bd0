//! Document numbering.
//!
//! A Bill-of-Lading / Sales Order number is the reference date as `YYYYMMDD`
//! followed by a three-digit sequence that restarts at `001` every day within
//! a scope. The counter lives in the backing store, keyed by `(scope, date)`,
//! so numbering continues across restarts and across processes sharing the
//! store.

use crate::error::{Error, Result};
use crate::store::CounterStore;
use chrono::{Local, NaiveDate};
use common::model::identifier::{format_date_part, DocumentIdentifier, MAX_SEQUENCE};
use log::{info, warn};
use std::str::FromStr;
use std::thread;
use std::time::{Duration, Instant};

/// Scope shared by every caller when numbering is global.
pub const GLOBAL_SCOPE: &str = "GLOBAL";

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(20);

/// Which callers share a daily sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScopeMode {
    /// One sequence per day for everybody.
    #[default]
    Global,
    /// One sequence per day for each customer.
    PerCustomer,
}

impl ScopeMode {
    /// Picks the scope key for a request made on behalf of `customer_id`.
    pub fn resolve(&self, customer_id: Option<&str>) -> Result<String> {
        match self {
            ScopeMode::Global => Ok(GLOBAL_SCOPE.to_string()),
            ScopeMode::PerCustomer => match customer_id.map(str::trim) {
                Some(id) if !id.is_empty() => Ok(id.to_string()),
                _ => Err(Error::InvalidInput(
                    "customer_id is required when identifiers are scoped per customer".into(),
                )),
            },
        }
    }
}

impl FromStr for ScopeMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "global" => Ok(ScopeMode::Global),
            "per_customer" | "customer" => Ok(ScopeMode::PerCustomer),
            other => Err(Error::InvalidInput(format!(
                "unknown scope mode '{other}', expected 'global' or 'per_customer'"
            ))),
        }
    }
}

pub struct IdentifierGenerator<S> {
    store: S,
    max_attempts: u32,
    backoff: Duration,
}

impl<S: CounterStore> IdentifierGenerator<S> {
    pub fn new(store: S) -> Self {
        IdentifierGenerator {
            store,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: DEFAULT_BACKOFF,
        }
    }

    /// Sets how many times a store outage is retried before giving up, and the
    /// base delay between attempts (multiplied by the attempt number).
    pub fn with_retry(mut self, max_attempts: u32, backoff: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.backoff = backoff;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Issues the next identifier for `(scope_key, reference_date)`.
    ///
    /// Sequences start at 1 and never repeat for a scope and date. The 1000th
    /// request for the same pair fails with `SequenceExhausted`; that is never
    /// retried. `StoreUnavailable` is retried up to the configured attempt
    /// count since a failed bump leaves the counter unchanged.
    pub fn next_identifier(
        &self,
        scope_key: &str,
        reference_date: NaiveDate,
    ) -> Result<DocumentIdentifier> {
        self.issue(scope_key, reference_date, None)
    }

    /// `next_identifier` that gives up once `deadline` passes.
    ///
    /// Giving up is always a `StoreUnavailable` error and never uses up a
    /// number: a bump that could only commit after the deadline is rolled
    /// back, and no retry starts that would end past it.
    pub fn next_identifier_before(
        &self,
        scope_key: &str,
        reference_date: NaiveDate,
        deadline: Instant,
    ) -> Result<DocumentIdentifier> {
        self.issue(scope_key, reference_date, Some(deadline))
    }

    fn issue(
        &self,
        scope_key: &str,
        reference_date: NaiveDate,
        deadline: Option<Instant>,
    ) -> Result<DocumentIdentifier> {
        let scope_key = validate_scope(scope_key)?;
        let date_part = date_part(reference_date)?;

        let mut attempt = 1;
        loop {
            match self
                .store
                .increment(scope_key, &date_part, u32::from(MAX_SEQUENCE), deadline)
            {
                Ok(Some(sequence)) => {
                    let id = u16::try_from(sequence)
                        .ok()
                        .and_then(|sequence| DocumentIdentifier::new(reference_date, sequence))
                        .ok_or_else(|| exhausted(scope_key, &date_part))?;
                    info!("Issued document number {} for scope {}", id, scope_key);
                    return Ok(id);
                }
                Ok(None) => {
                    warn!(
                        "Document numbers exhausted for scope {} on {}",
                        scope_key, date_part
                    );
                    return Err(exhausted(scope_key, &date_part));
                }
                Err(err) if err.is_retryable() && attempt < self.max_attempts => {
                    let pause = self.backoff * attempt;
                    if deadline.is_some_and(|deadline| Instant::now() + pause >= deadline) {
                        warn!(
                            "Counter update for {}/{} failed (attempt {}/{}), no time left to retry: {}",
                            scope_key, date_part, attempt, self.max_attempts, err
                        );
                        return Err(err);
                    }
                    warn!(
                        "Counter update for {}/{} failed (attempt {}/{}): {}",
                        scope_key, date_part, attempt, self.max_attempts, err
                    );
                    thread::sleep(pause);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// `next_identifier` for today's local date.
    pub fn next_for_today(&self, scope_key: &str) -> Result<DocumentIdentifier> {
        self.next_identifier(scope_key, Local::now().date_naive())
    }

    /// Last sequence issued for `(scope_key, reference_date)`, 0 if none.
    pub fn current_sequence(&self, scope_key: &str, reference_date: NaiveDate) -> Result<u32> {
        let scope_key = validate_scope(scope_key)?;
        self.store.current(scope_key, &date_part(reference_date)?)
    }
}

fn validate_scope(scope_key: &str) -> Result<&str> {
    let scope_key = scope_key.trim();
    if scope_key.is_empty() {
        return Err(Error::InvalidInput("scope key must not be empty".into()));
    }
    Ok(scope_key)
}

fn date_part(reference_date: NaiveDate) -> Result<String> {
    format_date_part(reference_date).ok_or_else(|| {
        Error::InvalidInput(format!(
            "{reference_date} cannot be written as an 8-digit YYYYMMDD date"
        ))
    })
}

fn exhausted(scope_key: &str, date_part: &str) -> Error {
    Error::SequenceExhausted {
        scope_key: scope_key.to_string(),
        date_part: date_part.to_string(),
        limit: MAX_SEQUENCE,
    }
}
