//! Command message dispatch for client input queues.
//!
//! Each poll cycle receives at most one message from a client's queue,
//! decodes it into a [`CommandEnvelope`], resolves the command type through
//! the [`CommandRegistry`], runs the handler, and deletes the message. The
//! delete happens whatever the outcome, so a malformed or rejected command is
//! consumed rather than redelivered.
//!
//! ## Protocol
//!
//! Clients publish a single JSON object per message:
//!
//! ```json
//! {"time":"t1","job_id":"j1","type":"START_JOB",
//!  "data":{"workflow":{"name":"transcode","version":"1","domain":"prod","taskList":"default"}}}
//! ```
//!
//! ## Validation order
//!
//! Decoding and the four top-level fields are checked first, then the command
//! type, then the `data.workflow` block. An unknown type is therefore always
//! reported as unknown, whatever its payload.

mod dispatcher;
mod envelope;
mod errors;
mod registry;
mod start_job;

pub use self::dispatcher::{
    CycleOutcome, DispatchSettings, Disposition, MessageDispatcher, RECEIVE_SLICE,
};
pub use self::envelope::{CommandEnvelope, WorkflowSpec};
pub use self::errors::{DispatchError, EnvelopeDefect};
pub use self::registry::{
    CommandHandler, CommandKind, CommandOutcome, CommandRegistry, HandlerContext,
};
