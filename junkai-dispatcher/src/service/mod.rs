//! Service layer
//!
//! Services contain the dispatch business logic: work selection, backend
//! invocation with outcome classification, cycle aggregation, and the
//! execution ledger. They operate through the repository traits so every
//! external system can be faked in tests.

mod aggregator;
mod invoker;
mod ledger;
mod selector;

#[cfg(test)]
pub(crate) mod test_support;

pub use aggregator::RunAggregator;
pub use invoker::BackendInvoker;
pub use ledger::{ExecutionLedger, FileLedger};
pub use selector::{Selection, WorkSelector};
