//! Counting in-memory `MetadataSource`

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tunescout_metadata::services::{MetadataSource, SourceOutcome};
use tunescout_metadata::MetadataRecord;

/// Answers from a fixed map, counting every invocation
#[derive(Default)]
pub struct MockSource {
    records: HashMap<String, MetadataRecord>,
    unreachable: bool,
    delay: Duration,
    calls: AtomicUsize,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(mut self, track_id: &str, record: MetadataRecord) -> Self {
        self.records.insert(track_id.to_string(), record);
        self
    }

    /// Every fetch reports the source as unreachable
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    /// Simulated network latency per fetch
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl MetadataSource for MockSource {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn fetch(&self, track_id: &str) -> SourceOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if self.unreachable {
            return SourceOutcome::Unreachable("mock source offline".to_string());
        }

        match self.records.get(track_id) {
            Some(record) => SourceOutcome::Found(record.clone()),
            None => SourceOutcome::NotFound,
        }
    }
}
