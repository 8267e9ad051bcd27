//! The storage name contract: `<base>-id<hex id>.<ext>`.
//!
//! The id embedded on upload is what lets verification find the approval
//! record for a signed file that was downloaded and passed around.

use regex::Regex;
use std::sync::OnceLock;

fn document_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"-id([0-9a-fA-F]+)\.").expect("Pattern is valid."))
}

/// Insert `-id<assigned_id>` in front of the extension.
///
/// A name without extension gets the id appended, so the result is still
/// parseable as long as the stored file has an extension added later.
pub fn build_storage_name(original_name: &str, assigned_id: &str) -> String {
    match original_name.rfind('.') {
        Some(dot) if dot > 0 => format!(
            "{}-id{}{}",
            &original_name[..dot],
            assigned_id,
            &original_name[dot..]
        ),
        _ => format!("{}-id{}", original_name, assigned_id),
    }
}

/// Recover the document id from a storage name.
///
/// Takes the last match, so a base name that itself contains `-id..` does
/// not shadow the id added on upload.
pub fn parse_document_id(file_name: &str) -> Option<String> {
    document_id_pattern()
        .captures_iter(file_name)
        .last()
        .map(|caps| caps[1].to_owned())
}
