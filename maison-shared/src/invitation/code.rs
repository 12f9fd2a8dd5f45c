/// Invitation code generation
///
/// Codes are 32 random base62 characters (about 190 bits), drawn from
/// `rand::thread_rng()`, a CSPRNG. They are short enough to read out or paste
/// into the join form and long enough that guessing one is hopeless.
///
/// ```
/// use maison_shared::invitation::code::{generate_code, is_well_formed, CODE_LENGTH};
///
/// let code = generate_code();
/// assert_eq!(code.len(), CODE_LENGTH);
/// assert!(is_well_formed(&code));
/// assert!(!is_well_formed("1234"));
/// ```

use rand::Rng;

/// Number of characters in an invitation code
pub const CODE_LENGTH: usize = 32;

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Generates a fresh random code
pub fn generate_code() -> String {
    let mut rng = rand::thread_rng();

    (0..CODE_LENGTH)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

/// Whether `code` has the shape of an issued code
///
/// Lets malformed input be rejected before any store lookup.
pub fn is_well_formed(code: &str) -> bool {
    code.len() == CODE_LENGTH && code.bytes().all(|b| b.is_ascii_alphanumeric())
}
