pub mod kitten;
pub mod rating;
pub mod user;

pub use kitten::{Kitten, KittenChanges, NewKitten};
pub use rating::Rating;
pub use user::User;
