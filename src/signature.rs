//! Text form of the detached CMS signature.
//!
//! Signing agents hand back the signature as a PEM-like block. The approval
//! service and the verifier only accept the bare base64 token, so the markers
//! and every whitespace character are removed before posting.

const CMS_BEGIN: &str = "-----BEGIN CMS-----";
const CMS_END: &str = "-----END CMS-----";
const LINE_WIDTH: usize = 64;

/// Remove the CMS markers and all whitespace from an agent signature.
pub fn strip_cms_envelope(signature: &str) -> String {
    signature
        .replace(CMS_BEGIN, "")
        .replace(CMS_END, "")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// Wrap a DER encoded CMS structure the way signing agents return it.
pub fn armor_cms(der: &[u8]) -> String {
    let encoded = base64::encode(der);
    let mut armored = String::with_capacity(encoded.len() + encoded.len() / LINE_WIDTH + 40);
    armored.push_str(CMS_BEGIN);
    armored.push('\n');
    // base64 output is ASCII, so splitting on byte boundaries is safe.
    for line in encoded.as_bytes().chunks(LINE_WIDTH) {
        armored.push_str(&String::from_utf8_lossy(line));
        armored.push('\n');
    }
    armored.push_str(CMS_END);
    armored.push('\n');
    armored
}
