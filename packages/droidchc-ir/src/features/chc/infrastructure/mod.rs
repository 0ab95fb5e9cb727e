pub mod clause_store;
pub mod smtlib;

pub use clause_store::{ClauseStore, StoreStats};
pub use smtlib::SmtLibExporter;
