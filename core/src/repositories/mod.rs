pub mod code_store;

pub use code_store::{CodeStore, InMemoryCodeStore};
