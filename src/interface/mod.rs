pub mod core;
pub mod repository;
