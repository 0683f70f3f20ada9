pub mod error;
mod options;
mod quad_store;
pub mod results;

pub use error::StorageError;
pub use options::QueryOptions;
pub use quad_store::{QuadStore, StoreDescription};
pub use results::QueryResults;
