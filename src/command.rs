//! Derives a search request from a raw chat message

use crate::error::CommandError;
use crate::models::SearchRequest;

/// Command words the bot answers to
const TRIGGERS: [&str; 3] = ["78dm", "78动漫", "模型搜索"];

/// Optional characters in front of a trigger
const PREFIXES: [&str; 2] = ["/", "#"];

/// Splits `raw` into a keyword and a page count.
///
/// A trailing all-digit token is taken as the page count when at least one
/// other token precedes it; the count is clamped into `1..=max_pages`.
pub fn parse_command(raw: &str, max_pages: u32) -> Result<SearchRequest, CommandError> {
    let text = raw.trim();
    let args = strip_trigger(text).ok_or(CommandError::UnknownTrigger)?;
    let args = args.trim();

    if args.is_empty() {
        return Err(CommandError::MissingKeyword);
    }

    let parts: Vec<&str> = args.split_whitespace().collect();
    let (keyword, pages) = match parts.split_last() {
        Some((last, rest)) if !rest.is_empty() && last.chars().all(|c| c.is_ascii_digit()) => {
            // Absurdly long digit runs overflow u32; treat them as the cap
            let requested = last.parse::<u32>().unwrap_or(u32::MAX);
            (rest.join(" "), requested.clamp(1, max_pages.max(1)))
        }
        _ => (args.to_string(), 1),
    };

    Ok(SearchRequest {
        keyword,
        max_pages: pages,
    })
}

/// Returns the text after the trigger, if `text` starts with one
fn strip_trigger(text: &str) -> Option<&str> {
    let body = PREFIXES
        .iter()
        .find_map(|p| text.strip_prefix(p))
        .unwrap_or(text);

    TRIGGERS.iter().find_map(|trigger| {
        let rest = body.strip_prefix(trigger)?;
        (rest.is_empty() || rest.starts_with(char::is_whitespace)).then_some(rest)
    })
}
