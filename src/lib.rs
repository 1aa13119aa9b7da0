//! canvass: Campaign Content Variant Workflow
//!
//! Generates candidate text variants for campaign content slots per constituency or
//! voter, stores them keyed by (slot, entity), and finalizes one as the canonical
//! artifact for downstream renderers.

pub mod artifact;
pub mod backend;
pub mod cli;
pub mod concurrency;
pub mod config;
pub mod directory;
pub mod error;
pub mod logging;
pub mod prompt;
pub mod similarity;
pub mod slot;
pub mod store;
pub mod types;
pub mod workflow;

pub use error::{ApiError, StorageError};
pub use workflow::{VariantWorkflow, WorkflowMode, WorkflowRequest};
