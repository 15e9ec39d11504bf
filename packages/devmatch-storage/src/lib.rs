pub mod chat;
pub mod connections;
pub mod db;
pub mod models;
pub mod profiles;
pub mod referrals;
pub mod schema;

mod error;

pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;
