pub mod connection;
pub mod exclusion;
pub mod feed;
pub mod profile_text;
pub mod referral;
pub mod search;
pub mod similarity;
