//! Run tracing for finresearch
//!
//! A *run* is one traced operation with its inputs, outputs or error, and
//! timing. Runs are handed to a [`Tracer`], which is injected wherever
//! tracing is wanted. [`NoopTracer`] stands in when tracing is disabled, so
//! callers never branch on whether a tracing backend exists.
//!
//! - [`TraceScope::traced`] wraps an async operation in a run
//! - [`LangSmithTracer`] records runs over the LangSmith HTTP API
//! - [`MemoryTracer`] keeps runs in memory for inspection

pub mod error;
pub mod langsmith;
pub mod run;
pub mod scope;
pub mod tracer;

pub use error::{Result, TraceError};
pub use langsmith::{LangSmithTracer, TraceConfig};
pub use run::{RunType, RunUpdate, TraceRun};
pub use scope::TraceScope;
pub use tracer::{MemoryTracer, NoopTracer, Tracer};
