pub mod common;
pub mod competition;
