//! Entry construction and validation.
//!
//! Provides an [`EntryBuilder`] that turns an unvalidated record request
//! into an [`Entry`]. Every field is required and the payer must not be
//! blank. Balance checks happen later, in the ledger, because they need
//! the store.

use chrono::{DateTime, Utc};

use rewards_types::{Entry, Payer, RecordRequest};

use crate::LedgerError;

// ---------------------------------------------------------------------------
// Entry builder
// ---------------------------------------------------------------------------

/// Builder for constructing validated [`Entry`] values.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use rewards_ledger::EntryBuilder;
///
/// let entry = EntryBuilder::new()
///     .payer("DANNON")
///     .points(300)
///     .timestamp(Utc::now())
///     .build();
///
/// assert!(entry.is_ok());
/// ```
#[derive(Debug, Default)]
pub struct EntryBuilder {
    payer: Option<Payer>,
    points: Option<i64>,
    timestamp: Option<DateTime<Utc>>,
}

impl EntryBuilder {
    /// Start building an entry with no fields set.
    pub const fn new() -> Self {
        Self {
            payer: None,
            points: None,
            timestamp: None,
        }
    }

    /// Set the payer.
    #[must_use]
    pub fn payer(mut self, payer: impl Into<Payer>) -> Self {
        self.payer = Some(payer.into());
        self
    }

    /// Set the signed points delta.
    #[must_use]
    pub const fn points(mut self, points: i64) -> Self {
        self.points = Some(points);
        self
    }

    /// Set the event time.
    #[must_use]
    pub const fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Validate inputs and produce an [`Entry`].
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::MissingField`] if any field is not set.
    /// Returns [`LedgerError::EmptyPayer`] if the payer name is blank.
    pub fn build(self) -> Result<Entry, LedgerError> {
        let payer = self.payer.ok_or(LedgerError::MissingField("payer"))?;
        let points = self.points.ok_or(LedgerError::MissingField("points"))?;
        let timestamp = self
            .timestamp
            .ok_or(LedgerError::MissingField("timestamp"))?;

        if payer.is_blank() {
            return Err(LedgerError::EmptyPayer);
        }

        Ok(Entry {
            payer,
            points,
            timestamp,
        })
    }
}

impl From<RecordRequest> for EntryBuilder {
    fn from(request: RecordRequest) -> Self {
        Self {
            payer: request.payer,
            points: request.points,
            timestamp: request.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_produces_valid_entry() {
        let now = Utc::now();
        let result = EntryBuilder::new()
            .payer("DANNON")
            .points(300)
            .timestamp(now)
            .build();

        assert!(result.is_ok());
        if let Ok(e) = result {
            assert_eq!(e.payer, Payer::from("DANNON"));
            assert_eq!(e.points, 300);
            assert_eq!(e.timestamp, now);
        }
    }

    #[test]
    fn negative_points_are_valid_clawbacks() {
        let result = EntryBuilder::new()
            .payer("DANNON")
            .points(-200)
            .timestamp(Utc::now())
            .build();

        assert!(matches!(result, Ok(ref e) if e.is_clawback()));
    }

    #[test]
    fn missing_payer_rejected() {
        let result = EntryBuilder::new().points(10).timestamp(Utc::now()).build();
        assert!(matches!(result, Err(LedgerError::MissingField("payer"))));
    }

    #[test]
    fn missing_points_rejected() {
        let result = EntryBuilder::new()
            .payer("DANNON")
            .timestamp(Utc::now())
            .build();
        assert!(matches!(result, Err(LedgerError::MissingField("points"))));
    }

    #[test]
    fn missing_timestamp_rejected() {
        let result = EntryBuilder::new().payer("DANNON").points(10).build();
        assert!(matches!(result, Err(LedgerError::MissingField("timestamp"))));
    }

    #[test]
    fn blank_payer_rejected() {
        let result = EntryBuilder::new()
            .payer("  ")
            .points(10)
            .timestamp(Utc::now())
            .build();
        assert!(matches!(result, Err(LedgerError::EmptyPayer)));
    }

    #[test]
    fn converts_from_record_request() {
        let request = RecordRequest {
            payer: Some(Payer::from("UNILEVER")),
            points: Some(200),
            timestamp: None,
        };
        let result = EntryBuilder::from(request).build();
        assert!(matches!(result, Err(LedgerError::MissingField("timestamp"))));
    }
}
