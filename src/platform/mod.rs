pub mod telegram;

use async_trait::async_trait;

/// Outbound side of the chat platform
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `text` to `chat_id`, rendered as HTML when `markup` is set
    async fn send(&self, chat_id: i64, text: &str, markup: bool) -> anyhow::Result<()>;
}

/// A message received from the platform, normalized for summarizing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Chat the message arrived in; replies go here
    pub chat_id: i64,
    pub text: Option<String>,
    pub media: Option<MediaKind>,
    pub caption: Option<String>,
    pub sender: UserIdentity,
    pub forward: Option<ForwardInfo>,
    /// Unix seconds
    pub date: i64,
}

impl InboundMessage {
    /// Forward details, if the message counts as forwarded
    pub fn forwarded(&self) -> Option<&ForwardInfo> {
        self.forward.as_ref().filter(|f| f.date != 0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub id: u64,
    pub is_bot: bool,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub language_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatIdentity {
    pub id: i64,
    /// Lowercase chat type: private, group, supergroup or channel
    pub kind: String,
    pub title: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardInfo {
    pub origin: ForwardOrigin,
    /// Id of the original message in its channel
    pub message_id: Option<i32>,
    /// Unix seconds of the original message
    pub date: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForwardOrigin {
    User(UserIdentity),
    /// Sender who disabled linking forwards to their account
    HiddenUser { name: String },
    Chat(ChatIdentity),
}

/// Non-text content, in detection priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Photo,
    Video,
    VideoNote,
    Audio,
    Voice,
    Sticker,
    Animation,
    Document,
    Game,
    Contact,
    Location,
    Venue,
}

impl MediaKind {
    pub fn label(self) -> &'static str {
        match self {
            MediaKind::Photo => "photo",
            MediaKind::Video => "video",
            MediaKind::VideoNote => "video note",
            MediaKind::Audio => "audio",
            MediaKind::Voice => "voice",
            MediaKind::Sticker => "sticker",
            MediaKind::Animation => "animation",
            MediaKind::Document => "document",
            MediaKind::Game => "game",
            MediaKind::Contact => "contact",
            MediaKind::Location => "location",
            MediaKind::Venue => "venue",
        }
    }
}

/// Leading bot command of a message, without slash or `@botname`.
/// Returns an empty string when the text is not a command.
pub fn command_token(text: &str) -> &str {
    let Some(rest) = text.strip_prefix('/') else {
        return "";
    };
    let word = rest.split(char::is_whitespace).next().unwrap_or("");
    word.split('@').next().unwrap_or("")
}
