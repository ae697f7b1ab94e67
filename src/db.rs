pub mod executor;
pub use executor::{DbError, QueryExecutor};
pub mod user_repo;
pub use user_repo::{CredentialStore, UserRepository};
pub mod sales_repo;
pub use sales_repo::{AggregateQuery, SalesRepository, SalesSource};
pub mod memory;
