/// Raw WebSocket data frame
/// Can be Text or Binary data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WsMessage {
    Text(String),
    Binary(Vec<u8>),
}

impl WsMessage {
    /// Get the message as text, if it is text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            WsMessage::Text(s) => Some(s),
            WsMessage::Binary(_) => None,
        }
    }

    /// Decode the frame payload as UTF-8 text
    ///
    /// Binary frames are accepted when they carry valid UTF-8, since some
    /// proxies re-frame JSON text as binary.
    pub fn to_text(&self) -> Option<&str> {
        match self {
            WsMessage::Text(s) => Some(s),
            WsMessage::Binary(b) => std::str::from_utf8(b).ok(),
        }
    }

    /// Check if message is text
    pub fn is_text(&self) -> bool {
        matches!(self, WsMessage::Text(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_utf8_is_readable_as_text() {
        let msg = WsMessage::Binary(br#"{"type":"x"}"#.to_vec());
        assert_eq!(msg.to_text(), Some(r#"{"type":"x"}"#));
        assert!(msg.as_text().is_none());
    }

    #[test]
    fn test_invalid_utf8_binary() {
        let msg = WsMessage::Binary(vec![0xff, 0xfe]);
        assert!(msg.to_text().is_none());
    }
}
