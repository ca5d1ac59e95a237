pub mod base;
pub mod cache;
pub mod frame;
