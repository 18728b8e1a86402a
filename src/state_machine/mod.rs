// Job execution state machine
//
// Tracks one remote execution from submission to its terminal state. Transitions
// are driven by what the execution backend reports; the machine only enforces
// that they move forward and that terminal states are final.

pub mod errors;
pub mod events;
pub mod job_state_machine;
pub mod states;

pub use errors::{StateMachineError, StateMachineResult};
pub use events::JobEvent;
pub use job_state_machine::{JobStateMachine, TransitionRecord};
pub use states::JobRunState;
