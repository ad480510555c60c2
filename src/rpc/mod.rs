pub mod bridge;
pub mod contract;
pub mod stack;
pub mod summary;
