/// Number of codes produced by [`generate`].
pub const CODE_COUNT: usize = 52 + 52 + 1 + 26 * (26 + 26 + 10) + 41;

const NUMERIC_CODES: std::ops::RangeInclusive<u32> = 420..=460;

fn letters() -> impl Iterator<Item = char> {
    ('a'..='z').chain('A'..='Z')
}

/// Build the full, ordered list of short codes probed by one scan pass.
///
/// Order:
/// - `44` + one letter, lowercase then uppercase
/// - `42` + one letter, lowercase then uppercase, then bare `42`
/// - `3` + lowercase letter + (lowercase, then uppercase, then digit)
/// - decimal numbers `420` through `460`
pub fn generate() -> Vec<String> {
    let mut out = Vec::with_capacity(CODE_COUNT);

    out.extend(letters().map(|c| format!("44{c}")));

    out.extend(letters().map(|c| format!("42{c}")));
    out.push("42".to_string());

    for c1 in 'a'..='z' {
        out.extend(letters().chain('0'..='9').map(|c2| format!("3{c1}{c2}")));
    }

    out.extend(NUMERIC_CODES.map(|n| n.to_string()));
    out
}
