//! Mock port adapters for integration tests.
//!
//! Records every storage write, log row and published payload so tests can
//! assert on the full history without touching flash, an SD card or a
//! real RTC.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use chrono::{NaiveDate, NaiveDateTime};
use drumcounter::app::events::Topic;
use drumcounter::app::ports::{
    ClockError, ClockPort, LogError, LogSinkPort, StorageError, StoragePort, Subscriber,
};

// ── MockNvs ───────────────────────────────────────────────────

#[derive(Default)]
pub struct MockNvs {
    store: HashMap<String, Vec<u8>>,
    pub writes: usize,
    pub fail_writes: bool,
}

#[allow(dead_code)]
impl MockNvs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(&self, namespace: &str, key: &str) -> Option<&[u8]> {
        self.store.get(&format!("{}::{}", namespace, key)).map(Vec::as_slice)
    }

    pub fn put_raw(&mut self, namespace: &str, key: &str, data: &[u8]) {
        self.store.insert(format!("{}::{}", namespace, key), data.to_vec());
    }
}

impl StoragePort for MockNvs {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        match self.store.get(&format!("{}::{}", namespace, key)) {
            Some(v) => {
                let n = v.len().min(buf.len());
                buf[..n].copy_from_slice(&v[..n]);
                Ok(n)
            }
            None => Err(StorageError::NotFound),
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::IoError);
        }
        self.writes += 1;
        self.store.insert(format!("{}::{}", namespace, key), data.to_vec());
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.store.contains_key(&format!("{}::{}", namespace, key))
    }
}

// ── MockClock ─────────────────────────────────────────────────

/// Wall clock that only moves when the test says so.
#[derive(Default)]
pub struct MockClock {
    pub now: Option<NaiveDateTime>,
    pub sets: Vec<NaiveDateTime>,
}

#[allow(dead_code)]
impl MockClock {
    pub fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> Self {
        Self {
            now: Some(datetime(y, mo, d, h, mi, s)),
            sets: Vec::new(),
        }
    }

    pub fn unset() -> Self {
        Self::default()
    }

    pub fn set_to(&mut self, y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) {
        self.now = Some(datetime(y, mo, d, h, mi, s));
    }
}

impl ClockPort for MockClock {
    fn now(&self) -> Option<NaiveDateTime> {
        self.now
    }

    fn set(&mut self, local: NaiveDateTime) -> Result<(), ClockError> {
        self.sets.push(local);
        self.now = Some(local);
        Ok(())
    }
}

pub fn datetime(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .and_then(|date| date.and_hms_opt(h, mi, s))
        .expect("valid test datetime")
}

// ── MockLog ───────────────────────────────────────────────────

#[derive(Default)]
pub struct MockLog {
    pub files: BTreeMap<String, Vec<String>>,
}

impl LogSinkPort for MockLog {
    fn exists(&self, day_key: &str) -> bool {
        self.files.contains_key(day_key)
    }

    fn append(&mut self, day_key: &str, row: &str) -> Result<(), LogError> {
        self.files.entry(day_key.to_string()).or_default().push(row.to_string());
        Ok(())
    }
}

// ── Recorder (Subscriber) ─────────────────────────────────────

pub type Published = Rc<RefCell<Vec<(Topic, String)>>>;

/// Subscriber that appends every delivery to a shared list.
pub struct Recorder(pub Published);

impl Subscriber for Recorder {
    fn deliver(&mut self, topic: Topic, payload: &str) {
        self.0.borrow_mut().push((topic, payload.to_string()));
    }
}

/// Last payload published on `topic`, if any.
#[allow(dead_code)]
pub fn last_on(published: &Published, topic: Topic) -> Option<String> {
    published
        .borrow()
        .iter()
        .rev()
        .find(|(t, _)| *t == topic)
        .map(|(_, p)| p.clone())
}
