//! Stored Values
//!
//! Every key maps to an [`Entry`]: the payload, a [`DataType`] tag, the time it
//! was created and an optional expiry deadline.
//!
//! Only [`DataType::String`] is ever written by the command set today. The
//! remaining tags exist so that richer value types can be added without changing
//! the shape of the key space.

use bytes::Bytes;
use std::time::{Duration, Instant};

/// The type tag carried by every stored entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    String,
    List,
    Set,
    Hash,
    SortedSet,
    Stream,
}

/// Represents a stored value with optional expiry time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// The actual value stored
    pub value: Bytes,
    /// What kind of value this is
    pub data_type: DataType,
    /// When this entry was created. Never changes after insertion.
    pub created_at: Instant,
    /// When this entry expires (None = never expires)
    pub expires_at: Option<Instant>,
}

impl Entry {
    /// Creates a new entry without expiry.
    pub fn new(value: Bytes, data_type: DataType) -> Self {
        Self {
            value,
            data_type,
            created_at: Instant::now(),
            expires_at: None,
        }
    }

    /// Creates a new string entry without expiry.
    pub fn string(value: Bytes) -> Self {
        Self::new(value, DataType::String)
    }

    /// Sets the absolute expiry deadline, consuming and returning the entry.
    pub fn with_expiry(mut self, deadline: Instant) -> Self {
        self.expires_at = Some(deadline);
        self
    }

    /// Checks if this entry has expired.
    ///
    /// An entry is expired only once the clock is strictly past its deadline.
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Checks expiry against a caller-supplied instant.
    #[inline]
    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|exp| now > exp)
    }

    /// Returns the remaining time to live, or None if the entry never expires.
    ///
    /// An entry past its deadline reports a zero TTL.
    pub fn ttl(&self) -> Option<Duration> {
        self.expires_at
            .map(|exp| exp.saturating_duration_since(Instant::now()))
    }
}
