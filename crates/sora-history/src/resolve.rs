//! Remix reference resolution.
//!
//! Precedence: `@N` index, then `@last`, then a recorded output filename
//! (exact path before base name, newest entry first), then the reference
//! itself as a literal job id.

use std::path::Path;

use sora_models::HistoryEntry;

use crate::error::{HistoryError, HistoryResult};

/// Token for the most recent entry.
pub const LAST_REFERENCE: &str = "@last";

/// Resolve `reference` against `entries` (most recent first).
pub fn resolve_reference(entries: &[HistoryEntry], reference: &str) -> HistoryResult<String> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(HistoryError::invalid_reference(reference));
    }

    if let Some(token) = reference.strip_prefix('@') {
        return resolve_token(entries, reference, token);
    }

    if let Some(entry) = find_by_output(entries, reference) {
        return Ok(entry.id.clone());
    }

    Ok(reference.to_string())
}

fn resolve_token(entries: &[HistoryEntry], reference: &str, token: &str) -> HistoryResult<String> {
    if let Ok(index) = token.parse::<usize>() {
        if entries.is_empty() {
            return Err(HistoryError::EmptyHistory);
        }
        return entries
            .get(index)
            .map(|e| e.id.clone())
            .ok_or(HistoryError::IndexOutOfRange {
                index,
                len: entries.len(),
            });
    }

    if reference == LAST_REFERENCE {
        return entries
            .first()
            .map(|e| e.id.clone())
            .ok_or(HistoryError::EmptyHistory);
    }

    Err(HistoryError::invalid_reference(reference))
}

fn find_by_output<'a>(entries: &'a [HistoryEntry], reference: &str) -> Option<&'a HistoryEntry> {
    let saved = || {
        entries
            .iter()
            .filter(|e| !e.output_file.is_empty() && e.output_file != "-")
    };

    if let Some(entry) = saved().find(|e| e.output_file == reference) {
        return Some(entry);
    }

    let wanted = Path::new(reference).file_name()?;
    saved().find(|e| Path::new(&e.output_file).file_name() == Some(wanted))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history() -> Vec<HistoryEntry> {
        vec![
            HistoryEntry::new("video_c", "third", "sora-2").output_file("renders/sunset.mp4"),
            HistoryEntry::new("video_b", "second", "sora-2").output_file("-"),
            HistoryEntry::new("video_a", "first", "sora-2").output_file("sunset.mp4"),
        ]
    }

    #[test]
    fn test_last_is_position_zero() {
        assert_eq!(resolve_reference(&history(), "@last").unwrap(), "video_c");
    }

    #[test]
    fn test_index_in_range() {
        let entries = history();
        assert_eq!(resolve_reference(&entries, "@0").unwrap(), "video_c");
        assert_eq!(resolve_reference(&entries, "@2").unwrap(), "video_a");
    }

    #[test]
    fn test_index_out_of_range() {
        let err = resolve_reference(&history(), "@3").unwrap_err();
        assert!(matches!(err, HistoryError::IndexOutOfRange { index: 3, len: 3 }));
    }

    #[test]
    fn test_empty_history_fails_shortcuts_only() {
        assert!(matches!(
            resolve_reference(&[], "@last").unwrap_err(),
            HistoryError::EmptyHistory
        ));
        assert!(matches!(
            resolve_reference(&[], "@0").unwrap_err(),
            HistoryError::EmptyHistory
        ));
        assert_eq!(resolve_reference(&[], "video_xyz").unwrap(), "video_xyz");
    }

    #[test]
    fn test_bad_token_is_invalid() {
        for reference in ["@first", "@-1", "@", "@1.5"] {
            let err = resolve_reference(&history(), reference).unwrap_err();
            assert!(matches!(err, HistoryError::InvalidReference(_)), "{}", reference);
        }
    }

    #[test]
    fn test_exact_output_path_wins_over_base_name() {
        assert_eq!(resolve_reference(&history(), "sunset.mp4").unwrap(), "video_a");
    }

    #[test]
    fn test_base_name_matches_newest() {
        assert_eq!(
            resolve_reference(&history(), "elsewhere/sunset.mp4").unwrap(),
            "video_c"
        );
    }

    #[test]
    fn test_unmatched_reference_passes_through() {
        assert_eq!(resolve_reference(&history(), " video_zzz ").unwrap(), "video_zzz");
        assert_eq!(resolve_reference(&history(), "-").unwrap(), "-");
    }
}
