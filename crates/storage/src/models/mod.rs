pub mod category;
pub mod competition;
pub mod flag;
pub mod timestamp;
pub mod user;

pub use category::{MainCategory, SubCategory};
pub use competition::{Competition, CompetitionListing, NewCompetition};
pub use user::User;
