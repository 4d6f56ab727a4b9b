//! # Tubes
//!
//! Ordered, short-circuitable message pipelines with composable aspects.
//!
//! Tubes provides:
//!
//! - **Pipelines**: run filters strictly in registration order, synchronously
//!   or asynchronously
//! - **Early termination**: messages can carry a stop flag that skips the
//!   remaining filters
//! - **Cooperative cancellation**: the async pipeline checks a token at every
//!   filter boundary
//! - **Aspects**: exception logging, message logging, retry and transaction
//!   decorators that nest around a single step
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tubes::prelude::*;
//!
//! let mut pipeline = AsyncPipeline::new();
//! pipeline
//!     .register(ValidateOrder)
//!     .register(RetryAspect::new(
//!         TransactionAspect::new(IgnoreTransaction(StoreOrder), provider),
//!         RetryOptions::new(3, Duration::from_millis(100))?,
//!     ));
//!
//! pipeline.execute_async(&mut order, &CancellationToken::new()).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod aspects;
pub mod cancellation;
pub mod config;
pub mod core;
pub mod errors;
pub mod filters;
pub mod logging;
pub mod pipeline;
pub mod registry;
pub mod testing;
pub mod transaction;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::aspects::{
        ExceptionLoggingAspect, MessageLoggingAspect, RetryAspect, RetryOptions,
        TransactionAspect,
    };
    pub use crate::cancellation::CancellationToken;
    pub use crate::config::TubesConfig;
    pub use crate::core::{Message, Outcome, OutcomeMessage, StopProcessing};
    pub use crate::errors::{Cancelled, TubesError};
    pub use crate::filters::{AsyncFilter, AsyncFnFilter, Filter, FnFilter, FnStep, Step};
    pub use crate::logging::{LogRecord, LogSink, LoggingConfig, TracingLogSink};
    pub use crate::pipeline::{AsyncPipeline, Pipeline};
    pub use crate::registry::{FilterRegistry, ServiceLifetime};
    pub use crate::transaction::{
        AsyncTransactionalStep, FnTransactionalStep, IgnoreTransaction,
        InMemoryTransactionProvider, Transaction, TransactionProvider, TransactionalStep,
    };
}
