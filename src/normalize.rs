//! OCR text cleanup.
//!
//! OCR of a rendered UI reliably produces two artifacts: hyphen+space pairs
//! where a word was wrapped across lines, and "|" where a capital I was
//! misread. Numeric answers occasionally pick up stray formatting inside
//! the digits. `normalize` removes all three and lower-cases the result,
//! producing the canonical form compared against snippet text.

/// Cleans a raw OCR string into its canonical comparable form.
///
/// Pure and total; applying it twice gives the same result as applying it
/// once. Step order matters: the hyphen and pipe fixes run on the raw text,
/// integer canonicalization runs on the lower-cased tokens.
pub fn normalize(raw: &str) -> String {
    // Join words the OCR broke across a line wrap ("soft- ware" → "software")
    let joined = raw.replace("- ", "");
    // "|" is the usual misread of capital I
    let repaired = joined.replace('|', "I");
    let lowered = repaired.to_lowercase();

    let tokens: Vec<String> = lowered
        .split(' ')
        .map(|token| match token.parse::<i64>() {
            Ok(value) => value.to_string(),
            Err(_) => token.to_string(),
        })
        .collect();

    tokens.join(" ")
}
