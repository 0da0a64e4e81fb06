//! Injection seams for the server's collaborators.
//!
//! Handlers talk to the normalizer and the ledger through these traits so
//! tests can substitute in-process fakes for the remote services.

use api_types::roster::Roster;
use async_trait::async_trait;
use engine::Allocation;
use ledger::{CreatedExpense, ExpenseId, LedgerError, SplitwiseLedger};
use normalizer::{DraftExpense, NormalizeError, OpenAiNormalizer};

#[async_trait]
pub trait ExpenseNormalizer: Send + Sync {
    async fn draft(
        &self,
        message: &str,
        roster: &Roster,
    ) -> Result<DraftExpense, NormalizeError>;
}

#[async_trait]
pub trait ExpenseLedger: Send + Sync {
    async fn roster(&self) -> Result<Roster, LedgerError>;

    async fn create_expense(
        &self,
        allocation: &Allocation,
        description: &str,
    ) -> Result<CreatedExpense, LedgerError>;

    async fn delete_expense(&self, id: ExpenseId) -> Result<(), LedgerError>;
}

#[async_trait]
impl ExpenseNormalizer for OpenAiNormalizer {
    async fn draft(
        &self,
        message: &str,
        roster: &Roster,
    ) -> Result<DraftExpense, NormalizeError> {
        OpenAiNormalizer::draft(self, message, roster).await
    }
}

#[async_trait]
impl ExpenseLedger for SplitwiseLedger {
    async fn roster(&self) -> Result<Roster, LedgerError> {
        SplitwiseLedger::roster(self).await
    }

    async fn create_expense(
        &self,
        allocation: &Allocation,
        description: &str,
    ) -> Result<CreatedExpense, LedgerError> {
        SplitwiseLedger::create_expense(self, allocation, description).await
    }

    async fn delete_expense(&self, id: ExpenseId) -> Result<(), LedgerError> {
        SplitwiseLedger::delete_expense(self, id).await
    }
}
