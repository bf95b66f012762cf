use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use uuid::Uuid;

const SCHEME: &str = "pbkdf2_sha256";

/// PBKDF2 iterations for production passwords.
pub const DEFAULT_ROUNDS: u32 = 600_000;

fn derive(password: &str, salt: &str, rounds: u32) -> String {
    let mut key = [0u8; 32];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), rounds, &mut key);
    key.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Hash a password as `pbkdf2_sha256$<rounds>$<salt>$<hex key>` with a fresh
/// random salt.
pub fn hash_password(password: &str, rounds: u32) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    format!("{}${}${}${}", SCHEME, rounds, salt, derive(password, &salt, rounds))
}

/// Check a password against a value produced by [`hash_password`]. The round
/// count comes from the stored value.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.splitn(4, '$');
    let (Some(scheme), Some(rounds), Some(salt), Some(expected)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    if scheme != SCHEME {
        return false;
    }
    let rounds = match rounds.parse::<u32>() {
        Ok(rounds) if rounds > 0 => rounds,
        _ => return false,
    };

    derive(password, salt, rounds)
        .as_bytes()
        .ct_eq(expected.as_bytes())
        .into()
}
