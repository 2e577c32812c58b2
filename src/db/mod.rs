//! Database layer
//!
//! Persistence for portfolio content on SQLite (default, single-file
//! deployment) or MySQL. The driver is selected by configuration and hidden
//! behind the `DatabasePool` trait; repositories dispatch to per-driver
//! query functions through `DatabasePool::backend`.

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, Backend, DatabasePool, DynDatabasePool, MysqlDatabase,
    SqliteDatabase,
};
