pub mod core;
pub mod books;
pub mod storage;
pub mod catalog;
pub mod utils;
