use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, FixedOffset, Utc};

use crate::domain::quote::QuoteId;

const JST_OFFSET_SECS: i32 = 9 * 3600;

static PROCESS_GENERATOR: QuoteIdGenerator = QuoteIdGenerator::new();

/// Issues `Q-<yyyyMMddHHmmss>-<seq>` ids. The timestamp is Japan time; `seq`
/// only ever grows, so two ids from one generator never collide.
#[derive(Debug)]
pub struct QuoteIdGenerator {
    sequence: AtomicU64,
}

impl QuoteIdGenerator {
    pub const fn new() -> Self {
        Self { sequence: AtomicU64::new(1) }
    }

    /// The generator shared by everything in this process.
    pub fn process() -> &'static QuoteIdGenerator {
        &PROCESS_GENERATOR
    }

    pub fn next_id(&self, now: DateTime<Utc>) -> QuoteId {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let stamp = match FixedOffset::east_opt(JST_OFFSET_SECS) {
            Some(jst) => now.with_timezone(&jst).format("%Y%m%d%H%M%S").to_string(),
            None => now.format("%Y%m%d%H%M%S").to_string(),
        };
        QuoteId(format!("Q-{stamp}-{sequence:06}"))
    }
}

impl Default for QuoteIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Sequence part of an id issued by [`QuoteIdGenerator`].
pub fn sequence_of(id: &QuoteId) -> Option<u64> {
    id.0.rsplit('-').next()?.parse().ok()
}
