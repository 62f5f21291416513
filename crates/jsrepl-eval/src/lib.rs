//! jsrepl evaluator: runs console fragments against a persistent binding store.
//!
//! A [`Session`] owns an engine context, a [`Store`] and a bounded log. Each
//! fragment goes through [`jsrepl_transform::transform`], its declared names
//! are registered in the store, and the generated body is called with the
//! store object as its scope:
//!
//! ```text
//! session.evaluate("let a = 5; a * 2")   → Completion::Ready(10)
//! session.evaluate("a")                  → Completion::Ready(10)
//! session.evaluate("await f()")          → Completion::Pending(promise)
//! session.settle(completion)             → value | EvalError
//! ```

pub mod config;
mod console;
pub mod entry;
pub mod error;
pub mod executor;
pub mod session;
pub mod store;

pub use config::ReplConfig;
pub use entry::LogEntry;
pub use error::{EvalError, EvalResult};
pub use executor::Completion;
pub use session::{Recall, Session};
pub use store::Store;
