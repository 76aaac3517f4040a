//! Utility functions for file name and path sanitization

/// Strip characters in U+0080..=U+00FF from a string
///
/// Step tags and templated destination paths may carry Latin-1 supplement
/// characters that several filesystems and archive tools mangle; artifact
/// file names are built from the stripped form.
///
/// # Examples
///
/// ```
/// use visreg_dl::utils::strip_high_bytes;
///
/// assert_eq!(strip_high_bytes("café"), "caf");
/// assert_eq!(strip_high_bytes("login page"), "login page");
/// ```
pub fn strip_high_bytes(input: &str) -> String {
    input
        .chars()
        .filter(|c| !('\u{0080}'..='\u{00ff}').contains(c))
        .collect()
}
