use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

pub mod roster {
    use super::*;

    /// A person known to the ledger service.
    ///
    /// `id` is the ledger service's numeric user id; it is the same value
    /// the allocation engine receives as a participant id.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Participant {
        pub id: i64,
        pub name: String,
        /// Present for friends; the ledger omits it for the current user.
        pub email: Option<String>,
    }

    /// The current user plus their friends, as reported by the ledger.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Roster {
        pub current_user: Participant,
        pub friends: Vec<Participant>,
    }
}

pub mod expense {
    use super::*;

    /// Request body for creating an expense from a free-text description.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseNew {
        /// Free text, e.g. "split $50 evenly between me and Ben".
        pub message: String,
    }

    /// One participant's slice of a created expense.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ShareView {
        pub participant_id: i64,
        /// Amount fronted by this participant, in minor units (cents).
        pub paid_minor: i64,
        /// Amount this participant is responsible for, in minor units.
        pub owed_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseCreated {
        /// Expense id assigned by the ledger service.
        pub id: i64,
        pub description: String,
        /// Total cost in minor units, as echoed by the ledger.
        pub cost_minor: i64,
        /// Payer first, then the other participants in request order.
        pub shares: Vec<ShareView>,
        /// RFC3339 timestamp, when the ledger reports one.
        pub created_at: Option<DateTime<FixedOffset>>,
    }
}
