pub mod competition;
pub mod user;
