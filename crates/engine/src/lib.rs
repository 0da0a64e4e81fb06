pub use allocation::{Allocation, ShareEntry, allocate};
pub use error::EngineError;
pub use money::Money;
pub use participant::{Participant, ParticipantId};
pub use policy::{SplitPolicy, SplitValue};
pub use request::AllocationRequest;

mod allocation;
mod error;
mod money;
mod participant;
mod policy;
mod request;

pub(crate) type ResultEngine<T> = Result<T, EngineError>;
