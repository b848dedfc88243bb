//! Canonical forms of codes sent to the accounting back-end.

/// Transliterate to ASCII and collapse every run of characters outside
/// `[0-9A-Za-z-]` into a single hyphen.
///
/// ```
/// use tradesync::core::text::to_alphanumeric;
///
/// assert_eq!(to_alphanumeric("Fritt vårt lager"), "Fritt-vart-lager");
/// assert_eq!(to_alphanumeric("ABC/123 ö"), "ABC-123-o");
/// ```
pub fn to_alphanumeric(word: &str) -> String {
    let nordic: String = word
        .chars()
        .map(|c| match c {
            'å' | 'ä' | 'à' | 'á' => 'a',
            'Å' | 'Ä' | 'À' | 'Á' => 'A',
            'ö' => 'o',
            'Ö' => 'O',
            'é' => 'e',
            'É' => 'E',
            other => other,
        })
        .collect();
    let ascii = deunicode::deunicode(&nordic);

    let mut out = String::with_capacity(ascii.len());
    let mut in_run = false;
    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() || c == '-' {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('-');
            in_run = true;
        }
    }
    out
}

/// Terms of delivery and way of delivery: alphanumeric, uppercase.
pub fn delivery_code(code: &str) -> String {
    to_alphanumeric(code).to_uppercase()
}

/// Terms of payment: alphanumeric, uppercase, hyphens removed.
pub fn payment_terms_code(code: &str) -> String {
    delivery_code(code).replace('-', "")
}

/// Currency codes are only uppercased.
pub fn currency_code(code: &str) -> String {
    code.to_uppercase()
}

/// Unit codes: alphanumeric, lowercase.
pub fn unit_code(code: &str) -> String {
    to_alphanumeric(code).to_lowercase()
}
