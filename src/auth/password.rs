use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::seq::SliceRandom;
use rand::Rng;

pub const MIN_LENGTH: usize = 12;
const GENERATED_LENGTH: usize = 16;

const LETTERS: &[u8] = b"abcdefghijkmnopqrstuvwxyzABCDEFGHJKLMNPQRSTUVWXYZ";
const DIGITS: &[u8] = b"23456789";
const SPECIALS: &[u8] = b"!@#$%^&*-_=+?";

pub fn hash(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, cost)
}

/// False for a wrong password and for an unreadable hash.
pub fn verify(password: &str, hash: &str) -> bool {
    match bcrypt::verify(password, hash) {
        Ok(ok) => ok,
        Err(e) => {
            tracing::error!("Unreadable password hash: {}", e);
            false
        }
    }
}

/// Passwords arrive base64 encoded. `None` if it is not valid base64 UTF-8.
pub fn decode(encoded: &str) -> Option<String> {
    let bytes = STANDARD.decode(encoded.trim()).ok()?;
    String::from_utf8(bytes).ok()
}

fn is_special(c: char) -> bool {
    !c.is_ascii_alphanumeric() && !c.is_whitespace()
}

/// At least [`MIN_LENGTH`] characters with a letter, a digit and a special character.
pub fn check_complexity(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_LENGTH {
        return Err(format!("must be at least {} characters", MIN_LENGTH));
    }
    if !password.chars().any(|c| c.is_alphabetic()) {
        return Err("must contain a letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("must contain a digit".to_string());
    }
    if !password.chars().any(is_special) {
        return Err("must contain a special character".to_string());
    }
    Ok(())
}

/// Random password that passes [`check_complexity`].
pub fn generate() -> String {
    let mut rng = rand::thread_rng();
    let mut pick = |set: &[u8]| set[rng.gen_range(0..set.len())];

    let mut chars = vec![pick(LETTERS), pick(DIGITS), pick(SPECIALS)];
    let all: Vec<u8> = [LETTERS, DIGITS, SPECIALS].concat();
    while chars.len() < GENERATED_LENGTH {
        chars.push(pick(all.as_slice()));
    }
    chars.shuffle(&mut rand::thread_rng());
    chars.into_iter().map(char::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_passwords_are_complex() {
        for _ in 0..50 {
            let password = generate();
            assert_eq!(password.len(), GENERATED_LENGTH);
            assert!(check_complexity(&password).is_ok(), "{}", password);
        }
    }

    #[test]
    fn complexity_rules() {
        assert!(check_complexity("Short1!").is_err());
        assert!(check_complexity("abcdefghijkl1").is_err());
        assert!(check_complexity("abcdefghijkl!").is_err());
        assert!(check_complexity("123456789012!").is_err());
        assert!(check_complexity("correct-horse-9").is_ok());
    }

    #[test]
    fn hash_and_verify() {
        let hashed = hash("s3cret!", 4).unwrap();
        assert!(verify("s3cret!", &hashed));
        assert!(!verify("wrong", &hashed));
        assert!(!verify("s3cret!", "not-a-hash"));
    }

    #[test]
    fn base64_decoding() {
        assert_eq!(decode("aGVsbG8=").as_deref(), Some("hello"));
        assert_eq!(decode("***"), None);
    }
}
