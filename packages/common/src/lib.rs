pub mod category;
pub mod config;
pub mod storage;

pub use category::{FileCategory, ParseCategoryError};
pub use config::StorageAppConfig;
