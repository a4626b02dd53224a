pub mod sheet;
pub mod storage;

pub use sheet::MemorySheet;
pub use storage::LocalStorage;
