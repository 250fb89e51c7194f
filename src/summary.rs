use chrono::DateTime;
use html_escape::encode_text;

use crate::platform::{ChatIdentity, ForwardInfo, ForwardOrigin, InboundMessage, UserIdentity};

/// Text ready to be delivered back to a chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub chat_id: i64,
    pub text: String,
    /// Text contains HTML tags
    pub markup: bool,
}

/// Describe a message: its content, who sent or originally wrote it, and when.
///
/// Direct messages always join first and last name with a space, even when
/// the last name is empty; forwarded users drop the separator in that case.
///
/// User-supplied strings are HTML-escaped, so `<`, `>` and `&` reach the
/// chat as entities. Telegram rejects the HTML parse mode otherwise.
pub fn summarize(msg: &InboundMessage) -> Summary {
    let mut lines = content_lines(msg);

    match msg.forwarded() {
        Some(forward) => lines.extend(forward_lines(forward)),
        None => lines.extend(sender_lines(&msg.sender, msg.date)),
    }

    Summary {
        chat_id: msg.chat_id,
        text: lines.join("\n"),
        markup: true,
    }
}

fn content_lines(msg: &InboundMessage) -> Vec<String> {
    if let Some(text) = msg.text.as_deref().filter(|t| !t.is_empty()) {
        return vec![format!("<b>Message:</b> {}", encode_text(text))];
    }

    let label = msg.media.map(|m| m.label()).unwrap_or("unknown");
    let mut lines = vec![format!("<b>Media Type:</b> {}", label)];

    if let Some(caption) = msg.caption.as_deref().filter(|c| !c.is_empty()) {
        lines.push(format!("<b>Caption:</b> {}", encode_text(caption)));
    }

    lines
}

fn forward_lines(forward: &ForwardInfo) -> Vec<String> {
    let mut lines = Vec::new();

    match &forward.origin {
        ForwardOrigin::User(user) => {
            let label = if user.is_bot { "Bot" } else { "User" };
            let name = match user.last_name.as_deref().filter(|l| !l.is_empty()) {
                Some(last) => format!("{} {}", user.first_name, last),
                None => user.first_name.clone(),
            };
            lines.push(format!(
                "<b>{}:</b> {} {}",
                label,
                encode_text(&name),
                ids(user.username.as_deref(), user.id)
            ));
        }
        ForwardOrigin::HiddenUser { name } => {
            lines.push(format!("<b>User:</b> {}", encode_text(name)));
        }
        ForwardOrigin::Chat(chat) => lines.push(chat_line(chat)),
    }

    if let Some(id) = forward.message_id.filter(|id| *id != 0) {
        lines.push(format!("<b>ID:</b> {}", id));
    }

    lines.push(format!(
        "<b>Date:</b> <code>{}</code>",
        utc_timestamp(forward.date)
    ));

    lines
}

fn chat_line(chat: &ChatIdentity) -> String {
    let suffix = ids(chat.username.as_deref(), chat.id);
    match chat.title.as_deref().filter(|t| !t.is_empty()) {
        Some(title) => format!(
            "<b>{}:</b> {} {}",
            title_case(&chat.kind),
            encode_text(title),
            suffix
        ),
        None => suffix,
    }
}

fn sender_lines(sender: &UserIdentity, date: i64) -> Vec<String> {
    vec![
        format!(
            "<b>User:</b> {} {} {}",
            encode_text(&sender.first_name),
            encode_text(sender.last_name.as_deref().unwrap_or("")),
            ids(sender.username.as_deref(), sender.id)
        ),
        format!(
            "<b>Expected Lang:</b> <code>{}</code>",
            encode_text(sender.language_code.as_deref().unwrap_or(""))
        ),
        format!("<b>Date:</b> <code>{}</code>", utc_timestamp(date)),
    ]
}

/// `(@username / id)` or `(id)`
fn ids(username: Option<&str>, id: impl std::fmt::Display) -> String {
    match username.filter(|u| !u.is_empty()) {
        Some(username) => format!(
            "(<code>@{}</code> / <code>{}</code>)",
            encode_text(username),
            id
        ),
        None => format!("(<code>{}</code>)", id),
    }
}

/// Render unix seconds as `2006-01-02 15:04:05 +0000 UTC`
fn utc_timestamp(secs: i64) -> String {
    match DateTime::from_timestamp(secs, 0) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S +0000 UTC").to_string(),
        None => secs.to_string(),
    }
}

/// Uppercase the first letter of every word
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut word_start = true;
    for c in s.chars() {
        if word_start && c.is_alphabetic() {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        word_start = !c.is_alphanumeric();
    }
    out
}
