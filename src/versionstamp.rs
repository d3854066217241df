// Copyright 2025 Cowboy AI, LLC.

//! Versionstamps: time-ordered, collision-resistant identifiers
//!
//! A versionstamp is 12 bytes:
//!
//! ```text
//! | timestamp_us (8, BE) | counter (2, BE) | salt (2) |
//! ```
//!
//! rendered as 24 lowercase hex characters. Because the timestamp and counter
//! are big-endian, byte order, hex-string order and issue order coincide for
//! stamps from one generator.

use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use schemars::gen::SchemaGenerator;
use schemars::schema::Schema;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, warn};

use crate::errors::{ProvenanceError, ProvenanceResult};

/// Number of raw bytes in a versionstamp
pub const STAMP_BYTES: usize = 12;

/// Length of the hex rendering of a versionstamp
pub const STAMP_HEX_LEN: usize = STAMP_BYTES * 2;

/// Latest timestamp a generator adopts: 9999-12-31T23:59:59.999999Z
///
/// Everything above it is left as headroom for counter rollover.
pub const MAX_TIMESTAMP_US: u64 = 253_402_300_799_999_999;

/// Identifier assigned to every entity at construction
///
/// Ordering is byte-wise, which is (timestamp, counter, salt) order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VersionId([u8; STAMP_BYTES]);

impl VersionId {
    /// Assemble a stamp from its three fields
    pub fn from_parts(timestamp_us: u64, counter: u16, salt: u16) -> Self {
        let mut bytes = [0u8; STAMP_BYTES];
        bytes[..8].copy_from_slice(&timestamp_us.to_be_bytes());
        bytes[8..10].copy_from_slice(&counter.to_be_bytes());
        bytes[10..].copy_from_slice(&salt.to_be_bytes());
        Self(bytes)
    }

    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; STAMP_BYTES]) -> Self {
        Self(bytes)
    }

    /// Parse a 24 character lowercase hex stamp
    pub fn parse(stamp: &str) -> ProvenanceResult<Self> {
        if !is_canonical_hex(stamp) {
            return Err(ProvenanceError::PoisonedStamp(stamp.to_string()));
        }
        let mut bytes = [0u8; STAMP_BYTES];
        hex::decode_to_slice(stamp, &mut bytes)
            .map_err(|_| ProvenanceError::PoisonedStamp(stamp.to_string()))?;
        Ok(Self(bytes))
    }

    /// Microsecond timestamp component
    pub fn timestamp_us(&self) -> u64 {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&self.0[..8]);
        u64::from_be_bytes(buf)
    }

    /// Per-microsecond counter component
    pub fn counter(&self) -> u16 {
        u16::from_be_bytes([self.0[8], self.0[9]])
    }

    /// Random salt component
    pub fn salt(&self) -> u16 {
        u16::from_be_bytes([self.0[10], self.0[11]])
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8; STAMP_BYTES] {
        &self.0
    }

    /// Hex rendering
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

fn is_canonical_hex(stamp: &str) -> bool {
    stamp.len() == STAMP_HEX_LEN
        && stamp
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VersionId({})", self.to_hex())
    }
}

impl FromStr for VersionId {
    type Err = ProvenanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for VersionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for VersionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        VersionId::parse(&raw).map_err(serde::de::Error::custom)
    }
}

impl JsonSchema for VersionId {
    fn schema_name() -> String {
        "VersionId".to_string()
    }

    fn json_schema(gen: &mut SchemaGenerator) -> Schema {
        String::json_schema(gen)
    }
}

/// Source of microsecond wall-clock readings
pub trait Clock: Send + Sync {
    /// Current time in microseconds since the Unix epoch
    fn now_micros(&self) -> u64;
}

/// Clock backed by [`SystemTime`]
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_micros(&self) -> u64 {
        // A pre-epoch system clock reads as zero; the generator keeps its own
        // monotonic floor so this only affects the first stamp.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as u64)
            .unwrap_or(0)
    }
}

#[derive(Debug, Default)]
struct ClockState {
    last_timestamp_us: u64,
    counter: u16,
}

impl ClockState {
    /// Advance past `timestamp_us`, returning the (timestamp, counter) to emit
    fn advance(&mut self, timestamp_us: u64) -> (u64, u16) {
        if timestamp_us > self.last_timestamp_us {
            self.last_timestamp_us = timestamp_us;
            self.counter = 0;
        } else if self.counter == u16::MAX {
            // counter space for this microsecond is exhausted; borrow the next one
            match self.last_timestamp_us.checked_add(1) {
                Some(next) => {
                    self.last_timestamp_us = next;
                    self.counter = 0;
                }
                // only reachable past MAX_TIMESTAMP_US headroom; stay put rather than wrap
                None => warn!("versionstamp clock saturated"),
            }
        } else {
            self.counter += 1;
        }
        (self.last_timestamp_us, self.counter)
    }
}

/// Thread-safe monotonic versionstamp generator
///
/// One generator is one monotonic clock. Independent generators do not
/// coordinate, so callers that need a single global order share one handle
/// (typically behind an `Arc`).
///
/// # Examples
///
/// ```rust
/// use lab_provenance::VersionstampGenerator;
///
/// let gen = VersionstampGenerator::new();
/// let a = gen.next();
/// let b = gen.next();
/// assert!(a < b);
/// assert!(VersionstampGenerator::validate(&a.to_string()));
/// ```
pub struct VersionstampGenerator {
    state: Mutex<ClockState>,
    clock: Box<dyn Clock>,
}

impl fmt::Debug for VersionstampGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VersionstampGenerator")
            .field("last_timestamp_us", &self.last_timestamp_us())
            .finish()
    }
}

impl Default for VersionstampGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionstampGenerator {
    /// Create a generator reading the system clock
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }

    /// Create a generator reading a custom clock
    pub fn with_clock(clock: impl Clock + 'static) -> Self {
        Self {
            state: Mutex::new(ClockState::default()),
            clock: Box::new(clock),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ClockState> {
        // ClockState is two integers updated together under the guard, so a
        // poisoned lock still holds a consistent value.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Issue the next stamp
    pub fn next(&self) -> VersionId {
        let now = self.clock.now_micros().min(MAX_TIMESTAMP_US);
        let (timestamp_us, counter) = self.lock().advance(now);
        let salt: u16 = rand::thread_rng().gen();
        VersionId::from_parts(timestamp_us, counter, salt)
    }

    /// Whether `stamp` is exactly 24 lowercase hex characters
    pub fn validate(stamp: &str) -> bool {
        VersionId::parse(stamp).is_ok()
    }

    /// Fold an externally produced stamp into this generator's clock
    ///
    /// The returned stamp carries the merged (timestamp, counter) and the
    /// external salt.
    pub fn merge(&self, stamp: &str) -> ProvenanceResult<VersionId> {
        let external = VersionId::parse(stamp).map_err(|err| {
            warn!(stamp, "rejected poisoned versionstamp");
            err
        })?;
        let incoming_us = external.timestamp_us();
        if incoming_us > MAX_TIMESTAMP_US {
            warn!(incoming_us, "rejected versionstamp beyond clock range");
            return Err(ProvenanceError::StampOverflow {
                incoming_us,
                max_us: MAX_TIMESTAMP_US,
            });
        }

        let mut state = self.lock();
        if incoming_us < state.last_timestamp_us {
            let current_us = state.last_timestamp_us;
            drop(state);
            warn!(incoming_us, current_us, "rejected out of order versionstamp");
            return Err(ProvenanceError::OutOfOrder {
                incoming_us,
                current_us,
            });
        }
        let (timestamp_us, counter) = state.advance(incoming_us);
        drop(state);

        let merged = VersionId::from_parts(timestamp_us, counter, external.salt());
        debug!(external = %external, merged = %merged, "merged versionstamp");
        Ok(merged)
    }

    /// Timestamp of the most recently issued or merged stamp
    pub fn last_timestamp_us(&self) -> u64 {
        self.lock().last_timestamp_us
    }
}
