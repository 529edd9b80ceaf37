pub mod models;
pub mod pool;
pub mod postgres;
pub mod repository;
