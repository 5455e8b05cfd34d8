pub const NAMES: &[&str] = &[
    "email_length",
    "email_domain_hash",
    "is_disposable_email",
    "is_gmail",
    "is_yahoo",
    "is_corporate_email",
    "email_has_numbers",
    "email_numeric_ratio",
];

const DISPOSABLE_DOMAINS: &[&str] = &[
    "tempmail.com",
    "guerrillamail.com",
    "10minutemail.com",
    "throwaway.email",
    "mailinator.com",
    "trashmail.com",
    "maildrop.cc",
    "yopmail.com",
    "temp-mail.org",
];

const FREE_PROVIDERS: &[&str] = &[
    "gmail.com",
    "yahoo.com",
    "hotmail.com",
    "outlook.com",
    "live.com",
    "aol.com",
    "icloud.com",
    "protonmail.com",
];

/// FNV-1a over the domain's bytes, reduced mod 10000. Deterministic across
/// process restarts and instances, unlike `std::collections::hash_map`'s
/// per-process randomized hasher.
fn domain_hash(domain: &str) -> u64 {
    const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;
    let mut hash = FNV_OFFSET_BASIS;
    for byte in domain.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash % 10_000
}

pub fn extract(email: &str) -> Vec<f64> {
    let (local_part, domain) = match email.split_once('@') {
        Some((local, domain)) => (local, domain),
        None => (email, "unknown.com"),
    };

    let is_disposable = DISPOSABLE_DOMAINS.contains(&domain);
    let is_gmail = domain == "gmail.com";
    let is_yahoo = domain == "yahoo.com";
    let is_corporate =
        !FREE_PROVIDERS.contains(&domain) && !is_disposable && domain.contains('.') && domain.len() > 5;
    let numbers_in_local = local_part.chars().filter(|c| c.is_ascii_digit()).count();
    let has_numbers = numbers_in_local > 0;
    let numeric_ratio = if local_part.is_empty() {
        0.0
    } else {
        numbers_in_local as f64 / local_part.chars().count() as f64
    };

    vec![
        email.chars().count() as f64,
        domain_hash(domain) as f64,
        is_disposable as u8 as f64,
        is_gmail as u8 as f64,
        is_yahoo as u8 as f64,
        is_corporate as u8 as f64,
        has_numbers as u8 as f64,
        numeric_ratio,
    ]
}
