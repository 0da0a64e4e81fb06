use std::fmt;

use crate::SplitValue;

/// Identifier of a participant, as assigned by the ledger service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParticipantId(i64);

impl ParticipantId {
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl From<i64> for ParticipantId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One person named in an allocation request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Participant {
    pub id: ParticipantId,
    /// Declared share under `Percentage` or `Exact` policies. `Equal`
    /// ignores it, and the payer may omit it to have their share inferred.
    pub split: Option<SplitValue>,
}

impl Participant {
    #[must_use]
    pub fn new(id: ParticipantId) -> Self {
        Self { id, split: None }
    }

    /// Sets the declared share.
    #[must_use]
    pub fn split(mut self, split: SplitValue) -> Self {
        self.split = Some(split);
        self
    }
}
