//! MoltNet durable workflow runtime (C6): a leader-less queue of workflow
//! records with per-step journaled results, standing in for the external
//! durable-workflow SDK the source system built against (Design Notes §9).
//! Registration, signing, diary writes, and relationship writes all pass
//! through a `Workflow` run here so they survive a process crash mid-step.

mod engine;
mod error;

pub use engine::{RetryPolicy, Step, StepFn, StepFuture, Workflow, WorkflowContext, WorkflowEngine};
pub use error::{WorkflowError, WorkflowResult};
