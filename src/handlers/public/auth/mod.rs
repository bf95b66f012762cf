// handlers/public/auth/mod.rs - Public authentication handlers

use serde::Deserialize;

pub mod login;    // POST /api/login - exchange credentials for a token pair
pub mod refresh;  // POST /api/token/refresh - new access token
pub mod register; // POST /api/register - create an account

pub use login::login_post;
pub use refresh::refresh_post;
pub use register::register_post;

/// Body of register and login. Missing fields arrive as empty strings and
/// fail validation or authentication like any other bad value.
#[derive(Debug, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}
