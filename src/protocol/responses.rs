//! Reply handling
//!
//! Defines reply codes and formatting for the control protocol.

use crate::storage::{Crumb, DirectoryEntry, ListResult};

/// Reply codes
pub const DIRECTORY_LISTING: u16 = 212;
pub const READY: u16 = 220;
pub const GOODBYE: u16 = 221;
pub const ACTION_OK: u16 = 250;
pub const CURRENT_DIRECTORY: u16 = 257;
pub const SERVICE_UNAVAILABLE: u16 = 421;
pub const LOCAL_ERROR: u16 = 451;
pub const COMMAND_UNRECOGNIZED: u16 = 500;
pub const SYNTAX_ERROR: u16 = 501;
pub const ALREADY_EXISTS: u16 = 521;
pub const UNAVAILABLE: u16 = 550;
pub const PAYLOAD_TOO_LARGE: u16 = 552;
pub const NAME_NOT_ALLOWED: u16 = 553;

/// Format a single-line reply
pub fn format_response(code: u16, message: &str) -> String {
    format!("{} {}\r\n", code, message)
}

/// Quote a relative directory for display, `/` for the root
pub fn quote_dir(relative: &str) -> String {
    if relative.is_empty() {
        "\"/\"".to_string()
    } else {
        format!("\"{}\"", relative)
    }
}

/// Format a listing as a multi-line 212 reply
///
/// Breadcrumb rows come first, root-first, then one row per entry.
pub fn format_listing(listing: &ListResult) -> String {
    let mut out = String::new();
    for crumb in &listing.breadcrumb {
        out.push_str(&crumb_line(crumb));
    }
    for entry in &listing.entries {
        out.push_str(&entry_line(entry));
    }
    out.push_str(&format_response(
        DIRECTORY_LISTING,
        &format!("{} entries", listing.entries.len()),
    ));
    out
}

fn crumb_line(crumb: &Crumb) -> String {
    format!("{}-crumb\t{}\t{}\r\n", DIRECTORY_LISTING, crumb.name, crumb.path)
}

fn entry_line(entry: &DirectoryEntry) -> String {
    let size = entry
        .size
        .map(|s| s.to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{}-{}\t{}\t{}\t{}\r\n",
        DIRECTORY_LISTING, entry.kind, size, entry.name, entry.relative_path
    )
}
