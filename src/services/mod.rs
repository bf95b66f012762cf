pub mod aggregator;
pub mod catalog;
pub mod error;
pub mod ledger;
pub mod ownership;
pub mod users;

pub use catalog::KittenCatalog;
pub use error::ServiceError;
pub use ledger::RatingLedger;
pub use users::UserService;
