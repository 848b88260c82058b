//! Track identity derivation
//!
//! The track identity is the correlation key between the now-playing metadata
//! feed and the vote ledger. Browser clients compute it from the displayed
//! artist/title and the server stores it verbatim, so every implementation
//! must produce byte-identical keys for the same input.

/// Separator placed between artist and title before normalization
pub const TRACK_SEPARATOR: &str = "||";

/// Derive the track identity for an (artist, title) pair
///
/// Joins `artist`, [`TRACK_SEPARATOR`] and `title`, lower-cases the result,
/// then drops every character outside `[a-z0-9|]`.
///
/// Inputs made entirely of punctuation or non-ASCII text collapse to the bare
/// separator `"||"`. That is a valid key, not an error.
///
/// # Examples
///
/// ```
/// use radiovote_common::track_identity;
///
/// assert_eq!(track_identity("Artist X", "Song Y!"), "artistx||songy");
/// assert_eq!(track_identity("", ""), "||");
/// ```
pub fn track_identity(artist: &str, title: &str) -> String {
    let joined = format!("{}{}{}", artist, TRACK_SEPARATOR, title);

    joined
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '|')
        .collect()
}
