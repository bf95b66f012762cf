pub mod kittens;
pub mod ratings;
pub mod tokens;
pub mod users;
