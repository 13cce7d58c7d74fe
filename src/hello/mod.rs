//! Sentinel hello record parsing
//!
//! Every Sentinel process periodically publishes a "hello" line on the
//! `__sentinel__:hello` channel announcing itself and the master topology it
//! observes. This module parses one such line into a comparable record.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Channel every Sentinel gossips on
pub const HELLO_CHANNEL: &str = "__sentinel__:hello";

/// Number of space-delimited fields in a hello payload
const HELLO_FIELDS: usize = 8;

/// Error while parsing a hello payload
#[derive(Debug, Error)]
pub enum HelloParseError {
    #[error("Expected {HELLO_FIELDS} fields, got {0}")]
    FieldCount(usize),
    #[error("Invalid {field}: {value}")]
    InvalidField { field: &'static str, value: String },
}

/// One parsed Sentinel gossip announcement
///
/// Equality and hashing cover every field; deduplication never matches on a
/// partial key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SentinelHello {
    /// Announcing sentinel IP
    pub sentinel_ip: String,
    /// Announcing sentinel port
    pub sentinel_port: u16,
    /// Announcing sentinel run id
    pub run_id: String,
    /// Announcing sentinel config epoch
    pub sentinel_epoch: u64,
    /// Monitored master name
    pub master_name: String,
    /// Monitored master IP
    pub master_ip: String,
    /// Monitored master port
    pub master_port: u16,
    /// Master config epoch
    pub master_epoch: u64,
}

impl FromStr for SentinelHello {
    type Err = HelloParseError;

    /// Parse the canonical space-delimited hello line:
    /// `<sentinel_ip> <sentinel_port> <run_id> <sentinel_epoch> <master_name>
    /// <master_ip> <master_port> <master_epoch>`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split(' ').collect();
        if fields.len() != HELLO_FIELDS {
            return Err(HelloParseError::FieldCount(fields.len()));
        }

        Ok(Self {
            sentinel_ip: fields[0].to_string(),
            sentinel_port: parse_field("sentinel_port", fields[1])?,
            run_id: fields[2].to_string(),
            sentinel_epoch: parse_field("sentinel_epoch", fields[3])?,
            master_name: fields[4].to_string(),
            master_ip: fields[5].to_string(),
            master_port: parse_field("master_port", fields[6])?,
            master_epoch: parse_field("master_epoch", fields[7])?,
        })
    }
}

fn parse_field<T: FromStr>(field: &'static str, value: &str) -> Result<T, HelloParseError> {
    value.parse().map_err(|_| HelloParseError::InvalidField {
        field,
        value: value.to_string(),
    })
}

impl fmt::Display for SentinelHello {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {} {} {}",
            self.sentinel_ip,
            self.sentinel_port,
            self.run_id,
            self.sentinel_epoch,
            self.master_name,
            self.master_ip,
            self.master_port,
            self.master_epoch
        )
    }
}
