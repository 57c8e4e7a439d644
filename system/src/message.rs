use crate::types::ParticipantId;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl std::default::Default for Color {
    fn default() -> Self {
        Self { r: 0, g: 0, b: 0 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid color {0:?}, expected #RRGGBB")]
pub struct ColorParseError(pub String);

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .strip_prefix('#')
            .filter(|hex| hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()))
            .ok_or_else(|| ColorParseError(s.to_owned()))?;
        let channel = |at: usize| {
            u8::from_str_radix(&hex[at..at + 2], 16).map_err(|_| ColorParseError(s.to_owned()))
        };
        Ok(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Frames pushed by the relay to every participant of a session.
///
/// The relay omits zero cursor positions and empty colors, so both decode with defaults.
/// Frames with a tag this client does not know decode to [`ServerFrame::Unknown`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerFrame {
    #[serde(rename_all = "camelCase")]
    Init {
        content: String,
        user_id: ParticipantId,
        #[serde(default)]
        color: Color,
    },
    #[serde(rename_all = "camelCase")]
    Update {
        user_id: ParticipantId,
        content: String,
    },
    #[serde(rename_all = "camelCase")]
    Cursor {
        user_id: ParticipantId,
        #[serde(default)]
        cursor_pos: usize,
        #[serde(default)]
        color: Color,
    },
    #[serde(rename_all = "camelCase")]
    UserJoined {
        user_id: ParticipantId,
        #[serde(default)]
        color: Color,
    },
    #[serde(rename_all = "camelCase")]
    UserLeft { user_id: ParticipantId },
    #[serde(other)]
    Unknown,
}

impl ServerFrame {
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn participant_id(&self) -> Option<&str> {
        match self {
            Self::Init { user_id, .. }
            | Self::Update { user_id, .. }
            | Self::Cursor { user_id, .. }
            | Self::UserJoined { user_id, .. }
            | Self::UserLeft { user_id } => Some(user_id),
            Self::Unknown => None,
        }
    }
}

/// Frames a client sends; the relay stamps them with the sender's id and color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientFrame {
    Update {
        content: String,
    },
    #[serde(rename_all = "camelCase")]
    Cursor { cursor_pos: usize },
}

impl ClientFrame {
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_parses_case_insensitively_and_prints_upper_case() {
        let color: Color = "#4ecdc4".parse().expect("valid color");
        assert_eq!(
            color,
            Color {
                r: 0x4E,
                g: 0xCD,
                b: 0xC4
            }
        );
        assert_eq!(color.to_string(), "#4ECDC4");
    }

    #[test]
    fn color_rejects_malformed_input() {
        for input in ["", "#fff", "4ECDC4", "#4ECDCZ", "#+f+f+f", "#4ECDC44"] {
            assert!(input.parse::<Color>().is_err(), "{:?} should fail", input);
        }
    }

    #[test]
    fn it_should_decode_init_frame() {
        let frame =
            ServerFrame::decode(r##"{"type":"init","content":"doc","userId":"u1","color":"#ffffff"}"##)
                .expect("valid frame");
        assert_eq!(
            frame,
            ServerFrame::Init {
                content: "doc".into(),
                user_id: "u1".into(),
                color: Color {
                    r: 255,
                    g: 255,
                    b: 255
                },
            }
        );
    }

    #[test]
    fn it_should_default_omitted_cursor_fields() {
        // The relay leaves out `cursorPos` when it is zero and always sends `content`.
        let frame =
            ServerFrame::decode(r#"{"type":"cursor","content":"","userId":"u2"}"#).expect("valid");
        assert_eq!(
            frame,
            ServerFrame::Cursor {
                user_id: "u2".into(),
                cursor_pos: 0,
                color: Color::default(),
            }
        );
    }

    #[test]
    fn it_should_map_unknown_tags_to_unknown() {
        let frame = ServerFrame::decode(r#"{"type":"typing","userId":"u2"}"#).expect("valid");
        assert_eq!(frame, ServerFrame::Unknown);
        assert_eq!(frame.participant_id(), None);
    }

    #[test]
    fn it_should_reject_malformed_frames() {
        assert!(ServerFrame::decode("not json").is_err());
        assert!(ServerFrame::decode(r#"{"content":"x"}"#).is_err());
        assert!(ServerFrame::decode(r#"{"type":"update","userId":"u2"}"#).is_err());
        assert!(ServerFrame::decode(r#"{"type":"cursor","userId":"u2","cursorPos":-1}"#).is_err());
    }

    #[test]
    fn client_frames_use_the_wire_names() {
        let text = ClientFrame::Cursor { cursor_pos: 7 }.encode().expect("encodes");
        assert_eq!(text, r#"{"type":"cursor","cursorPos":7}"#);

        let text = ClientFrame::Update {
            content: "hi".into(),
        }
        .encode()
        .expect("encodes");
        assert_eq!(text, r#"{"type":"update","content":"hi"}"#);
    }
}
