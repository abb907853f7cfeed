//! Executor: rule-based build/test simulation for agent submissions.
//!
//! Results feed phase metrics that the quality gate later checks. Latency
//! is injected through [`Delay`] so tests run instantly.
//!
//! # Modules
//!
//! - [`delay`]: `Delay` trait, `TokioDelay`, `NoDelay`
//! - [`language`]: `Language` tags and construct heuristics
//! - [`runner`]: `BuildExecutor` and its result types

pub mod delay;
pub mod language;
pub mod runner;

pub use delay::{Delay, NoDelay, TokioDelay};
pub use language::Language;
pub use runner::{BuildExecutor, BuildResult, ExecutionResult, ExecutorConfig, TestRunResult};
