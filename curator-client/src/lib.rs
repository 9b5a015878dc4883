pub mod coordinator;
pub mod error;
pub mod store;

pub use coordinator::{SharedArena, SubmitHandle, SyncCoordinator, SyncEvent};
pub use error::{Result, StoreError};
pub use store::{EntityStore, HttpStore, Mutation, MutationOp, MutationOutcome};
