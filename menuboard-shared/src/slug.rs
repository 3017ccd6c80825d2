/// Tenant slug validation and generation
///
/// The slug is the restaurant's public identifier (`/{slug}` on the menu
/// site). Valid slugs are lowercase ASCII letters and digits separated by
/// single hyphens, 3 to 63 characters long. The database enforces the same
/// format with a CHECK constraint and uniqueness with an index.
///
/// # Example
///
/// ```
/// use menuboard_shared::slug::{slugify, validate_slug};
///
/// let slug = slugify("Café de l'Olivier");
/// assert_eq!(slug, "cafe-de-l-olivier");
/// assert!(validate_slug(&slug).is_ok());
/// ```

use rand::Rng;

/// Minimum slug length
pub const MIN_SLUG_LENGTH: usize = 3;

/// Maximum slug length
pub const MAX_SLUG_LENGTH: usize = 63;

/// Slugs that collide with routes of the web front-end
const RESERVED_SLUGS: &[&str] = &[
    "admin", "api", "super", "login", "register", "health", "static", "landing", "billing",
];

/// Reasons a slug is rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlugError {
    #[error("Slug must be between 3 and 63 characters")]
    Length,

    #[error("Slug may only contain lowercase letters, digits and single hyphens")]
    InvalidCharacters,

    #[error("Slug '{0}' is reserved")]
    Reserved(String),
}

/// Validates a slug against the format and reserved list
pub fn validate_slug(slug: &str) -> Result<(), SlugError> {
    if slug.len() < MIN_SLUG_LENGTH || slug.len() > MAX_SLUG_LENGTH {
        return Err(SlugError::Length);
    }

    let valid_chars = slug
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-');
    if !valid_chars || slug.starts_with('-') || slug.ends_with('-') || slug.contains("--") {
        return Err(SlugError::InvalidCharacters);
    }

    if RESERVED_SLUGS.contains(&slug) {
        return Err(SlugError::Reserved(slug.to_string()));
    }

    Ok(())
}

/// Derives a slug from a restaurant name
///
/// Common Latin accents are folded to ASCII, every other run of
/// non-alphanumeric characters becomes one hyphen. The result is truncated to
/// the maximum length and padded with `"menu"` when too short, so it may still
/// be reserved; callers validate before use.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());

    for ch in name.chars().flat_map(fold_accent) {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }

    let mut slug = slug.trim_end_matches('-').to_string();

    if slug.len() > MAX_SLUG_LENGTH {
        slug.truncate(MAX_SLUG_LENGTH);
        slug = slug.trim_end_matches('-').to_string();
    }

    if slug.len() < MIN_SLUG_LENGTH {
        slug = if slug.is_empty() {
            "menu".to_string()
        } else {
            format!("{}-menu", slug)
        };
    }

    slug
}

/// Appends a random 4-character suffix, keeping the result within bounds
///
/// Used when the derived slug is already taken.
pub fn with_random_suffix(slug: &str) -> String {
    const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..4)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();

    let max_base = MAX_SLUG_LENGTH - suffix.len() - 1;
    let base = if slug.len() > max_base {
        slug[..max_base].trim_end_matches('-')
    } else {
        slug
    };

    format!("{}-{}", base, suffix)
}

fn fold_accent(ch: char) -> Vec<char> {
    let folded = match ch {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'a',
        'ç' | 'Ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' | 'È' | 'É' | 'Ê' | 'Ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' | 'Ì' | 'Í' | 'Î' | 'Ï' | 'ı' | 'İ' => 'i',
        'ñ' | 'Ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' => 'o',
        'ù' | 'ú' | 'û' | 'ü' | 'Ù' | 'Ú' | 'Û' | 'Ü' => 'u',
        'ý' | 'ÿ' | 'Ý' => 'y',
        'ş' | 'Ş' => 's',
        'ğ' | 'Ğ' => 'g',
        'ß' => return vec!['s', 's'],
        'æ' | 'Æ' => return vec!['a', 'e'],
        other => other,
    };
    vec![folded]
}
