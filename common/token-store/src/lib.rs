pub mod error;
pub mod storage;
pub mod token;

pub use error::{StorageError, StorageResult};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
pub use token::{TokenStore, TOKEN_KEY};
