// Short sortable ids: one base-36 "epoch" character followed by a base-36 counter.

use std::fmt::Display;

/// The reference year of the epoch character.
pub const EPOCH_YEAR: i32 = 2025;

/// Fresh counters are the wall clock in milliseconds modulo this value.
pub const COUNTER_MODULUS: u64 = 46_656_000_000;

/// Minimum width of the counter body.
pub const COUNTER_WIDTH: usize = 5;

const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut out: Vec<u8> = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

fn from_base36(s: &str) -> Option<u64> {
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    u64::from_str_radix(&s.to_ascii_lowercase(), 36).ok()
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub struct SequentialId {
    epoch: char,
    counter: u64,
}

impl SequentialId {
    /// A time-seeded id. Years past the range of a single base-36 digit wrap around.
    pub fn fresh(years_since_epoch: u32, unix_millis: u64) -> SequentialId {
        let epoch = DIGITS[(years_since_epoch % 36) as usize] as char;
        SequentialId {
            epoch,
            counter: unix_millis % COUNTER_MODULUS,
        }
    }

    /// Parses `<epoch char><base-36 body>`. Returns None for anything shorter
    /// than two characters or with a body that is not base 36.
    pub fn parse(s: &str) -> Option<SequentialId> {
        let s = s.trim();
        let mut chars = s.chars();
        let epoch = chars.next()?;
        let body = chars.as_str();
        let counter = from_base36(body)?;
        Some(SequentialId { epoch, counter })
    }

    /// The id that follows this one: same epoch, counter plus one.
    pub fn next(&self) -> SequentialId {
        SequentialId {
            epoch: self.epoch,
            counter: self.counter.saturating_add(1),
        }
    }

    pub fn epoch(&self) -> char {
        self.epoch
    }

    pub fn counter(&self) -> u64 {
        self.counter
    }
}

impl Display for SequentialId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{:0>width$}",
            self.epoch,
            to_base36(self.counter),
            width = COUNTER_WIDTH
        )
    }
}

/// Increments a previously generated id, or falls back to a fresh one when
/// `previous` is not a valid id.
///
/// ```
/// use roster_sync::ids::{next_id, SequentialId};
///
/// let id = next_id("1a4f3h", || SequentialId::fresh(0, 0));
/// assert_eq!(id.to_string(), "1a4f3i");
/// ```
pub fn next_id<F>(previous: &str, fresh: F) -> SequentialId
where
    F: FnOnce() -> SequentialId,
{
    match SequentialId::parse(previous) {
        Some(id) => id.next(),
        None => fresh(),
    }
}

/// Hands out consecutive ids for one batch. The first id comes from the seed,
/// the following ones increment the previous by one.
#[derive(Debug, Clone)]
pub struct IdSequence {
    last: Option<SequentialId>,
    seed: SequentialId,
}

impl IdSequence {
    pub fn new(seed: SequentialId) -> IdSequence {
        IdSequence { last: None, seed }
    }

    pub fn next_id(&mut self) -> SequentialId {
        let id = match self.last {
            Some(prev) => prev.next(),
            None => self.seed,
        };
        self.last = Some(id);
        id
    }
}
