//! MySQL 5.6 style global transaction identifiers and GTID sets.
//!
//! A [`ReplicationPosition`] is the set of transactions applied so far, kept as
//! sorted, merged intervals per source server:
//!
//! ```text
//! 3e11fa47-71ca-11e1-9e33-c80aa9429562:1-5:7,8a94f357-aab4-11df-86ab-c80aa9429562:1-3
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{InvalidatorError, InvalidatorResult};

/// The only flavor the decoder accepts when a marker carries a prefix
const MYSQL56_FLAVOR: &str = "MySQL56";

/// One transaction: `server_uuid:sequence_number`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Gtid {
    pub server: Uuid,
    pub sequence: u64,
}

impl Gtid {
    pub fn new(server: Uuid, sequence: u64) -> Self {
        Self { server, sequence }
    }

    /// Decode a position marker as delivered on the stream.
    ///
    /// Accepts `uuid:n` and the flavored form `MySQL56/uuid:n`.
    pub fn decode(marker: &str) -> InvalidatorResult<Self> {
        let marker = marker.trim();
        let body = match marker.split_once('/') {
            Some((flavor, body)) if flavor.eq_ignore_ascii_case(MYSQL56_FLAVOR) => body,
            Some((flavor, _)) => {
                return Err(InvalidatorError::bad_input(format!(
                    "unknown GTID flavor '{flavor}' in '{marker}'"
                )))
            }
            None => marker,
        };

        let (server, sequence) = body.split_once(':').ok_or_else(|| {
            InvalidatorError::bad_input(format!("invalid GTID '{marker}': expected uuid:sequence"))
        })?;

        let server = Uuid::parse_str(server.trim()).map_err(|e| {
            InvalidatorError::bad_input(format!("invalid server UUID in GTID '{marker}': {e}"))
        })?;

        let sequence: u64 = sequence.trim().parse().map_err(|e| {
            InvalidatorError::bad_input(format!("invalid sequence number in GTID '{marker}': {e}"))
        })?;

        if sequence == 0 {
            return Err(InvalidatorError::bad_input(format!(
                "invalid GTID '{marker}': sequence numbers start at 1"
            )));
        }

        Ok(Self { server, sequence })
    }
}

impl FromStr for Gtid {
    type Err = InvalidatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl fmt::Display for Gtid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.server, self.sequence)
    }
}

/// Closed interval of sequence numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Interval {
    start: u64,
    end: u64,
}

impl Interval {
    fn contains(&self, sequence: u64) -> bool {
        self.start <= sequence && sequence <= self.end
    }
}

/// Set of applied transactions, the invalidator's replication coordinate.
///
/// Positions only grow through [`append`](Self::append); the set is partially
/// ordered by inclusion, see [`at_least`](Self::at_least).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReplicationPosition {
    servers: BTreeMap<Uuid, Vec<Interval>>,
}

impl ReplicationPosition {
    /// The empty position (nothing applied)
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    /// Add one transaction. Appending a transaction already present is a no-op.
    pub fn append(&mut self, gtid: &Gtid) {
        self.add_interval(gtid.server, gtid.sequence, gtid.sequence);
    }

    /// Copy of this position with `gtid` appended
    pub fn appended(&self, gtid: &Gtid) -> Self {
        let mut next = self.clone();
        next.append(gtid);
        next
    }

    pub fn contains(&self, gtid: &Gtid) -> bool {
        self.servers
            .get(&gtid.server)
            .is_some_and(|intervals| intervals.iter().any(|i| i.contains(gtid.sequence)))
    }

    /// True when every transaction in `other` is also in `self`
    pub fn at_least(&self, other: &ReplicationPosition) -> bool {
        other.servers.iter().all(|(server, theirs)| {
            let Some(ours) = self.servers.get(server) else {
                return theirs.is_empty();
            };
            theirs.iter().all(|t| {
                ours.iter()
                    .any(|o| o.start <= t.start && t.end <= o.end)
            })
        })
    }

    /// Number of transactions in the set
    pub fn transaction_count(&self) -> u64 {
        self.servers
            .values()
            .flatten()
            .map(|i| i.end - i.start + 1)
            .sum()
    }

    fn add_interval(&mut self, server: Uuid, start: u64, end: u64) {
        let intervals = self.servers.entry(server).or_default();
        intervals.push(Interval { start, end });
        intervals.sort_by_key(|i| i.start);

        let mut merged: Vec<Interval> = Vec::with_capacity(intervals.len());
        for interval in intervals.drain(..) {
            match merged.last_mut() {
                Some(last) if interval.start <= last.end.saturating_add(1) => {
                    last.end = last.end.max(interval.end);
                }
                _ => merged.push(interval),
            }
        }
        *intervals = merged;
    }

    fn parse_server_set(&mut self, part: &str) -> InvalidatorResult<()> {
        let mut pieces = part.split(':');
        let server = pieces.next().unwrap_or_default().trim();
        let server = Uuid::parse_str(server).map_err(|e| {
            InvalidatorError::bad_input(format!("invalid server UUID in GTID set '{part}': {e}"))
        })?;

        let mut saw_interval = false;
        for piece in pieces {
            let piece = piece.trim();
            let (start, end) = match piece.split_once('-') {
                Some((start, end)) => (parse_sequence(start, part)?, parse_sequence(end, part)?),
                None => {
                    let n = parse_sequence(piece, part)?;
                    (n, n)
                }
            };
            if start == 0 || end < start {
                return Err(InvalidatorError::bad_input(format!(
                    "invalid interval '{piece}' in GTID set '{part}'"
                )));
            }
            self.add_interval(server, start, end);
            saw_interval = true;
        }

        if !saw_interval {
            return Err(InvalidatorError::bad_input(format!(
                "GTID set entry '{part}' has no intervals"
            )));
        }
        Ok(())
    }
}

fn parse_sequence(raw: &str, context: &str) -> InvalidatorResult<u64> {
    raw.trim().parse().map_err(|e| {
        InvalidatorError::bad_input(format!("invalid sequence '{raw}' in GTID set '{context}': {e}"))
    })
}

impl FromStr for ReplicationPosition {
    type Err = InvalidatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = match s.split_once('/') {
            Some((flavor, body)) if flavor.eq_ignore_ascii_case(MYSQL56_FLAVOR) => body,
            _ => s,
        };

        let mut position = ReplicationPosition::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            position.parse_server_set(part)?;
        }
        Ok(position)
    }
}

impl TryFrom<String> for ReplicationPosition {
    type Error = InvalidatorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ReplicationPosition> for String {
    fn from(value: ReplicationPosition) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ReplicationPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (n, (server, intervals)) in self.servers.iter().enumerate() {
            if n > 0 {
                f.write_str(",")?;
            }
            write!(f, "{server}")?;
            for interval in intervals {
                if interval.start == interval.end {
                    write!(f, ":{}", interval.start)?;
                } else {
                    write!(f, ":{}-{}", interval.start, interval.end)?;
                }
            }
        }
        Ok(())
    }
}
