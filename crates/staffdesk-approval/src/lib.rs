//! Reaction-driven approval of application messages.
//!
//! A staff member reacting ✅ or ❌ on a directory message resolves the
//! application: the decision is written back to the spreadsheet, the
//! applicant is told by DM, and the message gets a confirmation reply.

pub mod authorize;
pub mod decision;
pub mod directory;
pub mod notify;
pub mod sheet;
pub mod workflow;

pub use authorize::StaffPolicy;
pub use decision::{Decision, Resolution};
pub use directory::DirectoryMessage;
pub use sheet::{SinkError, StatusSink, WebhookSink};
pub use workflow::{ApprovalWorkflow, DecisionReport, Delivery, IgnoreReason, Outcome, WorkflowError};
