use scraper::ElementRef;

use super::{caption_text, find_preceding_heading, stripped_text};

/// Decide whether a results table belongs to the general election.
///
/// The caption is checked first, then the nearest preceding `h3`/`h4`.
/// Without a positive signal the table is rejected: a missed table can still
/// be picked up by a later fallback strategy, a misread primary cannot be
/// taken back.
pub fn is_general_election(table: ElementRef) -> bool {
    if let Some(caption) = caption_text(table) {
        if caption.contains("primary") || caption.contains("runoff") {
            return false;
        }
        if caption.contains("election") {
            return true;
        }
    }

    if let Some(heading) = find_preceding_heading(table, &["h3", "h4"]) {
        let text = stripped_text(heading).to_lowercase();
        if text.contains("general election") || text.contains("results") {
            return true;
        }
        if text.contains("primary") || text.contains("runoff") {
            return false;
        }
    }

    false
}
