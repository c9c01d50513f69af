/// `mailto:` links for handing a draft to the user's mail client.
///
/// Builds `mailto:<recipient>?subject=..&body=..`. Subject and body are percent-encoded
/// byte-for-byte (everything but `A-Za-z0-9-_.~`), so newlines become `%0A` and spaces
/// `%20`. The recipient is trimmed of surrounding whitespace and otherwise left unencoded.
pub fn create_mailto_link(recipient: &str, subject: &str, body: &str) -> String {
    format!(
        "mailto:{}?subject={}&body={}",
        recipient.trim(),
        urlencoding::encode(subject),
        urlencoding::encode(body)
    )
}
