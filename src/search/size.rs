//! Size parsing and message size estimation.

/// Parse a byte size with an optional K/M/G suffix (1024-based, case
/// insensitive), as used by `larger:`/`smaller:`.
pub fn parse_size(value: &str) -> Option<u64> {
    let upper = value.trim().to_ascii_uppercase();
    if upper.is_empty() {
        return None;
    }
    let (digits, multiplier) = if let Some(d) = upper.strip_suffix('K') {
        (d, 1024)
    } else if let Some(d) = upper.strip_suffix('M') {
        (d, 1024 * 1024)
    } else if let Some(d) = upper.strip_suffix('G') {
        (d, 1024 * 1024 * 1024)
    } else {
        (upper.as_str(), 1)
    };
    digits.trim().parse::<u64>().ok().map(|n| n * multiplier)
}

/// Estimate a message's size the way the reference simulator does: header
/// field character lengths, the plain-text body length, plus each part's
/// stored size (falling back to a base64-expansion estimate of
/// `len(data) * 3 / 4` when only inline data is present).
pub fn calculate_message_size(message: &crate::models::Message) -> u64 {
    let mut total = message.subject.len() as u64;
    total += super::text_index::body_text(message).len() as u64;
    total += message.from.email.len() as u64;
    total += message.to.iter().map(|a| a.email.len() as u64).sum::<u64>();

    for part in message.payload.flat_parts() {
        if let Some(size) = part.body.size {
            total += size;
        } else if let Some(data) = &part.body.data {
            total += (data.len() as u64 * 3) / 4;
        }
    }

    total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size_suffixes() {
        assert_eq!(parse_size("10"), Some(10));
        assert_eq!(parse_size("1K"), Some(1024));
        assert_eq!(parse_size("2m"), Some(2 * 1024 * 1024));
        assert_eq!(parse_size("1G"), Some(1024 * 1024 * 1024));
    }

    #[test]
    fn test_parse_size_invalid() {
        assert_eq!(parse_size("abc"), None);
        assert_eq!(parse_size(""), None);
    }

    #[test]
    fn test_calculate_message_size_does_not_double_count_first_part() {
        use crate::models::{EmailAddress, Message, MessageId, MessagePart, MessagePartBody, ThreadId};

        let part = MessagePart {
            part_id: "1".to_string(),
            mime_type: "application/octet-stream".to_string(),
            filename: "a.bin".to_string(),
            headers: Vec::new(),
            body: MessagePartBody { size: Some(100), data: None, attachment_id: None },
            parts: Vec::new(),
        };
        let mut m = Message::builder(MessageId::new("m1"), ThreadId::new("t1"))
            .from(EmailAddress::new("a@example.com"))
            .subject("hi")
            .build();
        m.payload.parts.push(part);

        let expected = m.subject.len() as u64
            + super::super::text_index::body_text(&m).len() as u64
            + m.from.email.len() as u64
            + 100;
        assert_eq!(calculate_message_size(&m), expected);
    }
}
