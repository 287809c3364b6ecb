//! Snowflake ID Generator
//!
//! Time-ordered 64-bit ids for users and messages:
//!
//! ```text
//! 63                          22          12          0
//! +---------------------------+-----------+-----------+
//! |  ms since epoch (41 bits) | machine   | sequence  |
//! |                           | (10 bits) | (12 bits) |
//! +---------------------------+-----------+-----------+
//! ```

use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

/// Default custom epoch (2024-01-01T00:00:00.000Z)
pub const DEFAULT_EPOCH: u64 = 1_704_067_200_000;

const MACHINE_BITS: u64 = 10;
const SEQUENCE_BITS: u64 = 12;
const MACHINE_MASK: u64 = (1 << MACHINE_BITS) - 1;
const SEQUENCE_MASK: u64 = (1 << SEQUENCE_BITS) - 1;

#[derive(Debug, Default)]
struct GeneratorState {
    last_timestamp: u64,
    sequence: u64,
}

/// Snowflake ID generator
///
/// Ids are strictly increasing for a single generator. When the 4096 ids of a
/// millisecond are exhausted, or the wall clock steps backwards, the generator
/// keeps counting on the last timestamp it issued.
#[derive(Debug)]
pub struct SnowflakeGenerator {
    machine_id: u64,
    epoch: u64,
    state: Mutex<GeneratorState>,
}

impl SnowflakeGenerator {
    /// Create a new snowflake generator
    pub fn new(machine_id: u16, epoch: u64) -> Self {
        Self {
            machine_id: machine_id as u64 & MACHINE_MASK,
            epoch,
            state: Mutex::new(GeneratorState::default()),
        }
    }

    /// Generate a new snowflake ID
    pub fn generate(&self) -> i64 {
        let mut state = self.state.lock();

        let now = current_millis().max(self.epoch);
        if now > state.last_timestamp {
            state.last_timestamp = now;
            state.sequence = 0;
        } else {
            state.sequence = (state.sequence + 1) & SEQUENCE_MASK;
            if state.sequence == 0 {
                state.last_timestamp += 1;
            }
        }

        let id = ((state.last_timestamp - self.epoch) << (MACHINE_BITS + SEQUENCE_BITS))
            | (self.machine_id << SEQUENCE_BITS)
            | state.sequence;

        id as i64
    }

    /// Millisecond timestamp embedded in an id from this generator
    pub fn timestamp_of(&self, id: i64) -> u64 {
        ((id as u64) >> (MACHINE_BITS + SEQUENCE_BITS)) + self.epoch
    }
}

impl Default for SnowflakeGenerator {
    fn default() -> Self {
        Self::new(1, DEFAULT_EPOCH)
    }
}

fn current_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
