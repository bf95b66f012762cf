pub mod models;
pub mod store;

pub use models::{Kitten, KittenChanges, NewKitten, Rating, User};
pub use store::{DatabaseError, Store};
