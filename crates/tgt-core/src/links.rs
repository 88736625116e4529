use std::sync::OnceLock;

use regex::Regex;

use crate::{
    domain::{ChatHandle, MessageLink},
    errors::Error,
    Result,
};

fn channel_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^https?://t\.me(?:/c)?/(\w+)/(\d+)/?$").unwrap())
}

fn forum_topic_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^https?://t\.me(?:/c)?/(\w+)/(\d+)/(\d+)/?$").unwrap())
}

fn open_message_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^tg://openmessage\?user_id=(\w+)&message_id=(\d+)$").unwrap())
}

/// Private-channel numeric ids are addressed with a `-100` prefix.
fn channel_handle(raw: &str) -> ChatHandle {
    if raw.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(id) = format!("-100{raw}").parse::<i64>() {
            return ChatHandle::Id(id);
        }
    }
    ChatHandle::Username(raw.to_string())
}

/// Parse a message link into (chat, optional topic, starting message id).
///
/// Exactly three shapes are accepted:
/// - `https://t.me[/c]/<chat>/<msgid>`
/// - `https://t.me[/c]/<chat>/<topicid>/<msgid>`
/// - `tg://openmessage?user_id=<id>&message_id=<msgid>`
pub fn parse_link(link: &str) -> Result<MessageLink> {
    if let Some(caps) = channel_re().captures(link) {
        return Ok(MessageLink {
            chat: channel_handle(&caps[1]),
            topic_id: None,
            message_id: parse_id(&caps[2], link)?,
        });
    }

    if let Some(caps) = forum_topic_re().captures(link) {
        return Ok(MessageLink {
            chat: channel_handle(&caps[1]),
            topic_id: Some(parse_id(&caps[2], link)?),
            message_id: parse_id(&caps[3], link)?,
        });
    }

    if let Some(caps) = open_message_re().captures(link) {
        return Ok(MessageLink {
            chat: ChatHandle::parse(&caps[1]),
            topic_id: None,
            message_id: parse_id(&caps[2], link)?,
        });
    }

    Err(Error::InvalidLink(link.to_string()))
}

fn parse_id(raw: &str, link: &str) -> Result<i64> {
    raw.parse::<i64>()
        .map_err(|_| Error::InvalidLink(link.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_public_channel_link() {
        let link = parse_link("https://t.me/some_channel/42").unwrap();
        assert_eq!(link.chat, ChatHandle::Username("some_channel".to_string()));
        assert_eq!(link.topic_id, None);
        assert_eq!(link.message_id, 42);
    }

    #[test]
    fn parses_private_channel_link_with_minus_100_prefix() {
        let link = parse_link("https://t.me/c/1234567/99").unwrap();
        assert_eq!(link.chat, ChatHandle::Id(-1001234567));
        assert_eq!(link.message_id, 99);
    }

    #[test]
    fn parses_forum_topic_link() {
        let link = parse_link("https://t.me/c/1234567/55/800").unwrap();
        assert_eq!(link.chat, ChatHandle::Id(-1001234567));
        assert_eq!(link.topic_id, Some(55));
        assert_eq!(link.message_id, 800);
    }

    #[test]
    fn parses_open_message_link_without_prefixing() {
        let link = parse_link("tg://openmessage?user_id=777000&message_id=12").unwrap();
        assert_eq!(link.chat, ChatHandle::Id(777000));
        assert_eq!(link.topic_id, None);
        assert_eq!(link.message_id, 12);
    }

    #[test]
    fn accepts_trailing_slash_and_plain_http() {
        let link = parse_link("http://t.me/chan/10/").unwrap();
        assert_eq!(link.message_id, 10);
    }

    #[test]
    fn rejects_malformed_links() {
        for bad in [
            "",
            "not a link",
            "https://t.me/only_chat",
            "https://t.me/chan/abc",
            "https://example.com/chan/1",
            "tg://openmessage?user_id=1",
            "https://t.me/c/1/2/3/4",
        ] {
            assert!(
                matches!(parse_link(bad), Err(Error::InvalidLink(_))),
                "expected InvalidLink for {bad:?}"
            );
        }
    }

    #[test]
    fn parsing_is_pure() {
        let a = parse_link("https://t.me/c/42/7").unwrap();
        let b = parse_link("https://t.me/c/42/7").unwrap();
        assert_eq!(a, b);
    }
}
