//! # Fetch–Dedupe Pipeline
//!
//! One collection cycle:
//! 1. Every registered `SourceAdapter` fetches its storefront concurrently
//! 2. Results are concatenated (registration order)
//! 3. Each game is checked against the `GameStore` and inserted if absent
//! 4. Games this cycle inserted form the delta handed to the notifier
//!
//! A source that errors or panics contributes nothing for the cycle; it is
//! simply tried again next time.

pub mod aggregator;

pub use aggregator::Aggregator;
