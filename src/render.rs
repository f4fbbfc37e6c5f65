//! Turning search hits into chat messages.
//!
//! Links are HTML anchors whose visible text is the instruction name.
//! Results are packed into as few messages as fit under the chat
//! protocol's size limit; when the hits would need more than the allowed
//! number of messages the caller is told to ask for a narrower query.

use crate::config::RenderConfig;
use crate::models::Item;

/// Escape text for the body of an HTML element.
pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape text for a double-quoted HTML attribute.
pub fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}

/// `<a href="URL">NAME</a>`
pub fn format_link(item: &Item) -> String {
    format!(
        "<a href=\"{}\">{}</a>",
        escape_attr(&item.download_url),
        escape_text(&item.name)
    )
}

/// Length as counted by Telegram: UTF-16 code units.
pub fn message_len(s: &str) -> usize {
    s.encode_utf16().count()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Nothing matched.
    Empty,
    /// One or more messages, each within the size limit.
    Messages(Vec<String>),
    /// The hits do not fit in the allowed number of messages.
    TooMany,
}

const SEPARATOR: &str = "\n\n";

/// Pack search hits into messages.
///
/// A single hit is sent bare. Several hits are introduced by `header` and
/// separated by blank lines, split greedily across messages. The header
/// only ever shares a message with the first link; if the two do not fit
/// together the header is left out.
pub fn compose_results(links: &[String], header: &str, limits: &RenderConfig) -> RenderOutcome {
    match links {
        [] => RenderOutcome::Empty,
        [single] => {
            if message_len(single) > limits.max_message_chars {
                RenderOutcome::TooMany
            } else {
                RenderOutcome::Messages(vec![single.clone()])
            }
        }
        _ => pack(links, header, limits),
    }
}

fn pack(links: &[String], header: &str, limits: &RenderConfig) -> RenderOutcome {
    let sep_len = message_len(SEPARATOR);
    let mut messages: Vec<String> = Vec::new();
    let mut current = header.to_string();
    let mut current_len = message_len(header);
    let mut header_only = true;

    for link in links {
        let link_len = message_len(link);
        if link_len > limits.max_message_chars {
            return RenderOutcome::TooMany;
        }

        let needed = if current.is_empty() {
            link_len
        } else {
            current_len + sep_len + link_len
        };

        if needed <= limits.max_message_chars {
            if !current.is_empty() {
                current.push_str(SEPARATOR);
            }
            current.push_str(link);
            current_len = needed;
            header_only = false;
            continue;
        }

        if header_only {
            tracing::debug!("result header does not fit with the first link, dropping it");
            current = link.clone();
            current_len = link_len;
            header_only = false;
            continue;
        }

        messages.push(std::mem::take(&mut current));
        if messages.len() >= limits.max_messages {
            return RenderOutcome::TooMany;
        }
        current.push_str(link);
        current_len = link_len;
    }

    if !current.is_empty() {
        messages.push(current);
    }
    RenderOutcome::Messages(messages)
}
