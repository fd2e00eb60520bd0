use backend::services::identifiers::generator::{IdentifierGenerator, GLOBAL_SCOPE};
use backend::store::{CounterStore, FieldStorage, SqliteStore};
use backend::Error;
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

fn open(dir: &TempDir) -> SqliteStore {
    SqliteStore::open(
        dir.path().join("docs.sqlite"),
        Duration::from_secs(30),
        FieldStorage::Structured,
    )
    .unwrap()
}

fn jan(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, day).unwrap()
}

#[test]
fn first_numbers_of_consecutive_days() {
    let dir = TempDir::new().unwrap();
    let generator = IdentifierGenerator::new(open(&dir));

    let issued: Vec<String> = [jan(5), jan(5), jan(6)]
        .into_iter()
        .map(|day| generator.next_identifier(GLOBAL_SCOPE, day).unwrap().rendered())
        .collect();
    assert_eq!(issued, ["20260105001", "20260105002", "20260106001"]);
}

#[test]
fn numbering_continues_after_reopening_the_store() {
    let dir = TempDir::new().unwrap();
    {
        let generator = IdentifierGenerator::new(open(&dir));
        generator.next_identifier(GLOBAL_SCOPE, jan(5)).unwrap();
        generator.next_identifier(GLOBAL_SCOPE, jan(5)).unwrap();
    }

    let generator = IdentifierGenerator::new(open(&dir));
    let id = generator.next_identifier(GLOBAL_SCOPE, jan(5)).unwrap();
    assert_eq!(id.rendered(), "20260105003");
}

#[test]
fn thousandth_request_of_a_day_is_refused() {
    let dir = TempDir::new().unwrap();
    let generator = IdentifierGenerator::new(open(&dir));

    let mut previous = 0;
    for _ in 0..999 {
        let id = generator.next_identifier("CUST-42", jan(5)).unwrap();
        assert_eq!(id.sequence(), previous + 1);
        previous = id.sequence();
    }

    let err = generator.next_identifier("CUST-42", jan(5)).unwrap_err();
    assert!(matches!(err, Error::SequenceExhausted { .. }));
    // Other days and scopes are unaffected.
    assert_eq!(generator.next_identifier("CUST-42", jan(6)).unwrap().sequence(), 1);
    assert_eq!(generator.next_identifier("CUST-43", jan(5)).unwrap().sequence(), 1);
}

#[test]
fn concurrent_requests_get_distinct_contiguous_numbers() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 25;

    let dir = TempDir::new().unwrap();
    let generator = Arc::new(IdentifierGenerator::new(open(&dir)));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let generator = Arc::clone(&generator);
            thread::spawn(move || {
                (0..PER_THREAD)
                    .map(|_| generator.next_identifier(GLOBAL_SCOPE, jan(5)).unwrap().sequence())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut all = Vec::new();
    for handle in handles {
        all.extend(handle.join().unwrap());
    }

    let distinct: BTreeSet<u16> = all.iter().copied().collect();
    let total = (THREADS * PER_THREAD) as u16;
    assert_eq!(all.len(), distinct.len(), "a sequence number was issued twice");
    assert_eq!(distinct, (1..=total).collect::<BTreeSet<_>>());
}

#[test]
fn separate_store_handles_share_one_counter() {
    let dir = TempDir::new().unwrap();
    let first = open(&dir);
    let second = open(&dir);

    assert_eq!(first.increment(GLOBAL_SCOPE, "20260105", 999, None).unwrap(), Some(1));
    assert_eq!(second.increment(GLOBAL_SCOPE, "20260105", 999, None).unwrap(), Some(2));
    assert_eq!(first.current(GLOBAL_SCOPE, "20260105").unwrap(), 2);
}
