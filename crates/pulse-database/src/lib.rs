//! # pulse-database
//!
//! PostgreSQL persistence for Pulse: connection pool management, the
//! migration runner, and the sqlx repositories implementing the domain
//! store contracts.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
