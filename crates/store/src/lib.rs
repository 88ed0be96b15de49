pub mod backend;
pub mod error;
mod key;
mod models;

pub use crate::backend::KvStore;
pub use crate::key::{MAX_KEY_BYTES, join as join_key, normalize_path, validate as validate_key};
pub use crate::models::BulkEntry;
use std::sync::Arc;

pub type StoreHandle = Arc<dyn KvStore + Send + Sync>;
