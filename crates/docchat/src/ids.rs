use std::sync::atomic::{AtomicU64, Ordering};

/// Source of unique identifiers for text units and messages.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Random 21 character ids, the default for live traffic.
#[derive(Debug, Default, Clone, Copy)]
pub struct NanoIdGenerator;

impl IdGenerator for NanoIdGenerator {
    fn generate(&self) -> String {
        nanoid::nanoid!()
    }
}

/// Predictable ids (`<prefix>-0`, `<prefix>-1`, ...) for tests and replays.
#[derive(Debug)]
pub struct SequentialIdGenerator {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new<S: Into<String>>(prefix: S) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(0),
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn generate(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", self.prefix, n)
    }
}
