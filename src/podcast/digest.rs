//! Headline digest rendered in Telegram's HTML subset.

use chrono::NaiveDate;

use crate::feed::HeadlineRecord;

pub const NO_NEWS: &str = "No recent news available.";

/// "March 10, 2025"
pub fn long_date(date: NaiveDate) -> String {
    date.format("%B %d, %Y").to_string()
}

/// Render a numbered, hyperlinked list of headlines.
///
/// Pure: the same headlines and date always give the same bytes.
pub fn format_digest(items: &[HeadlineRecord], show: &str, date: NaiveDate) -> String {
    if items.is_empty() {
        return NO_NEWS.to_string();
    }

    let mut lines = vec![
        format!("📰 <b>{} - Latest Headlines</b>", escape_html(show)),
        format!("📅 {}", long_date(date)),
        String::new(),
    ];

    for (idx, item) in items.iter().enumerate() {
        lines.push(format!(
            "<b>{}.</b> <a href='{}'>{}</a>",
            idx + 1,
            escape_html(&item.link),
            escape_html(&item.title)
        ));
        lines.push(String::new());
    }

    lines.push("\n🎙️ Listen to the full audio summary below!".to_string());
    lines.join("\n")
}

/// Escape the characters Telegram's HTML parse mode treats specially.
fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&#39;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
