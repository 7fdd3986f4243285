//! 基础设施层（Infrastructure）
//!
//! 持有稀缺资源（存储、时钟），只暴露能力，不认识业务流程。

pub mod clock;
pub mod json_file_store;
pub mod memory_store;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use json_file_store::JsonFileStore;
pub use memory_store::{MemoryStore, StoreSnapshot};
pub use store::{keys, Index, ItemKey, KvStore, StoredItem, Table};
