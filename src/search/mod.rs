pub mod store;

#[cfg(test)]
mod store_tests;

pub use store::{SearchBackend, SearchSession, SearchStore};
