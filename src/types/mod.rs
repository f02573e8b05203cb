pub mod account;
pub mod batch;
pub mod common;
pub mod participant;
pub mod report;

pub use account::AccountId;
pub use batch::Batch;
pub use common::{BaseUnits, BatchIndex, Gas};
pub use participant::{ParticipantRecord, ValidatedParticipant};
pub use report::{RunReport, SubmissionResult, SubmissionStatus};
