// ABOUTME: Parser for the SMSC delivery receipt text carried in deliver_sm short messages
// ABOUTME: Extracts id/sub/dlvrd/dates/stat/err/text fields and renders them back canonically

use std::collections::BTreeMap;
use std::fmt;

/// Receipt keys in canonical order: (field name, key as written in the text).
const KEYS: [(&str, &str); 8] = [
    ("id", "id:"),
    ("sub", "sub:"),
    ("dlvrd", "dlvrd:"),
    ("submit_date", "submit date:"),
    ("done_date", "done date:"),
    ("stat", "stat:"),
    ("err", "err:"),
    ("text", "text:"),
];

/// Delivery status code from the `stat` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    /// Message is still being delivered
    Enroute,
    /// Message delivered successfully
    Delivered,
    /// Message expired before delivery
    Expired,
    /// Message was deleted
    Deleted,
    /// Message undeliverable
    Undeliverable,
    /// Message accepted by SMSC
    Accepted,
    /// Message rejected
    Rejected,
    /// Message skipped
    Skipped,
    /// Unknown status
    Unknown,
}

impl DeliveryStatus {
    /// Map the seven letter receipt code, case-insensitively.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "ENROUTE" => Self::Enroute,
            "DELIVRD" => Self::Delivered,
            "EXPIRED" => Self::Expired,
            "DELETED" => Self::Deleted,
            "UNDELIV" => Self::Undeliverable,
            "ACCEPTD" => Self::Accepted,
            "REJECTD" => Self::Rejected,
            "SKIPPED" => Self::Skipped,
            _ => Self::Unknown,
        }
    }

    /// Check if this is a final status.
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            Self::Delivered | Self::Expired | Self::Deleted | Self::Undeliverable | Self::Rejected
        )
    }

    /// Receipt code for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enroute => "ENROUTE",
            Self::Delivered => "DELIVRD",
            Self::Expired => "EXPIRED",
            Self::Deleted => "DELETED",
            Self::Undeliverable => "UNDELIV",
            Self::Accepted => "ACCEPTD",
            Self::Rejected => "REJECTD",
            Self::Skipped => "SKIPPED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

/// Fields of a delivery receipt.
///
/// The usual layout is
///
/// ```text
/// id:IIIIIIIIII sub:SSS dlvrd:DDD submit date:YYMMDDhhmm done date:YYMMDDhhmm stat:DDDDDDD err:E text:...
/// ```
///
/// Keys are matched case-insensitively where they start a token. `text`
/// runs to the end of the input and may contain spaces; every other value
/// runs to the next key. Missing and unknown fields are tolerated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeliveryReceipt {
    fields: BTreeMap<&'static str, String>,
}

impl DeliveryReceipt {
    pub fn parse(input: &str) -> Self {
        // ASCII lowercasing keeps byte offsets aligned with `input`.
        let lower = input.to_ascii_lowercase();
        let mut fields = BTreeMap::new();

        let text_at = find_key(&lower, "text:", input.len());
        let limit = text_at.unwrap_or(input.len());

        let mut found: Vec<(usize, &'static str, usize)> = KEYS
            .iter()
            .filter(|(name, _)| *name != "text")
            .filter_map(|&(name, key)| find_key(&lower, key, limit).map(|at| (at, name, key.len())))
            .collect();
        found.sort_unstable();

        for (i, &(at, name, key_len)) in found.iter().enumerate() {
            let end = found.get(i + 1).map_or(limit, |next| next.0);
            let value = input[at + key_len..end].trim();
            fields.insert(name, value.to_string());
        }

        if let Some(at) = text_at {
            fields.insert("text", input[at + "text:".len()..].to_string());
        }

        Self { fields }
    }

    /// Value of a field by name (`id`, `sub`, `dlvrd`, `submit_date`,
    /// `done_date`, `stat`, `err`, `text`).
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn id(&self) -> Option<&str> {
        self.get("id")
    }

    pub fn stat(&self) -> Option<&str> {
        self.get("stat")
    }

    pub fn err(&self) -> Option<&str> {
        self.get("err")
    }

    pub fn text(&self) -> Option<&str> {
        self.get("text")
    }

    pub fn submit_date(&self) -> Option<&str> {
        self.get("submit_date")
    }

    pub fn done_date(&self) -> Option<&str> {
        self.get("done_date")
    }

    pub fn submitted(&self) -> Option<u32> {
        self.get("sub").and_then(|v| v.parse().ok())
    }

    pub fn delivered(&self) -> Option<u32> {
        self.get("dlvrd").and_then(|v| v.parse().ok())
    }

    pub fn status(&self) -> DeliveryStatus {
        self.stat()
            .map_or(DeliveryStatus::Unknown, DeliveryStatus::from_code)
    }

    /// Text identifies itself as a receipt when it names both the message
    /// and its state.
    pub fn is_receipt(&self) -> bool {
        self.id().is_some() && self.stat().is_some()
    }

    pub fn fields(&self) -> &BTreeMap<&'static str, String> {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// First occurrence of `key` in `haystack[..limit]` that starts a token.
fn find_key(haystack: &str, key: &str, limit: usize) -> Option<usize> {
    let window = &haystack[..limit];
    let mut from = 0;
    while let Some(offset) = window[from..].find(key) {
        let at = from + offset;
        let at_boundary = window[..at]
            .chars()
            .next_back()
            .is_none_or(char::is_whitespace);
        if at_boundary {
            return Some(at);
        }
        from = at + key.len();
    }
    None
}

impl fmt::Display for DeliveryReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, key) in KEYS {
            let Some(value) = self.fields.get(name) else {
                continue;
            };
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            write!(f, "{key}{value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECEIPT: &str = "id:1b1720be-5f48-41c4-b3f8-6e59dbf45366 sub:001 dlvrd:001 \
         submit date:120726132548 done date:120726132548 stat:DELIVRD err:000 text:";

    #[test]
    fn parses_standard_receipt() {
        let receipt = DeliveryReceipt::parse(RECEIPT);
        assert_eq!(receipt.id(), Some("1b1720be-5f48-41c4-b3f8-6e59dbf45366"));
        assert_eq!(receipt.stat(), Some("DELIVRD"));
        assert_eq!(receipt.submitted(), Some(1));
        assert_eq!(receipt.delivered(), Some(1));
        assert_eq!(receipt.submit_date(), Some("120726132548"));
        assert_eq!(receipt.done_date(), Some("120726132548"));
        assert_eq!(receipt.err(), Some("000"));
        assert_eq!(receipt.text(), Some(""));
        assert_eq!(receipt.status(), DeliveryStatus::Delivered);
        assert!(receipt.is_receipt());
    }

    #[test]
    fn text_keeps_spaces_and_key_like_words() {
        let receipt = DeliveryReceipt::parse("id:7 stat:UNDELIV err:021 Text:hello id:x world");
        assert_eq!(receipt.id(), Some("7"));
        assert_eq!(receipt.text(), Some("hello id:x world"));
        assert_eq!(receipt.status(), DeliveryStatus::Undeliverable);
    }

    #[test]
    fn tolerates_missing_and_unknown_fields() {
        let receipt = DeliveryReceipt::parse("id:42 foo:bar stat:ENROUTE");
        assert_eq!(receipt.id(), Some("42 foo:bar"));
        assert_eq!(receipt.stat(), Some("ENROUTE"));
        assert_eq!(receipt.text(), None);
        assert!(!receipt.status().is_final());

        let empty = DeliveryReceipt::parse("hello world");
        assert!(empty.is_empty());
        assert!(!empty.is_receipt());
        assert_eq!(empty.status(), DeliveryStatus::Unknown);
    }

    #[test]
    fn keys_only_match_at_token_start() {
        let receipt = DeliveryReceipt::parse("msgid:abc id:def stat:DELIVRD");
        assert_eq!(receipt.id(), Some("def"));
    }

    #[test]
    fn reparsing_rendered_receipt_is_stable() {
        let parsed = DeliveryReceipt::parse(RECEIPT);
        let reparsed = DeliveryReceipt::parse(&parsed.to_string());
        assert_eq!(parsed, reparsed);
        assert_eq!(parsed.to_string(), RECEIPT);
    }

    #[test]
    fn rendering_is_canonical() {
        let parsed = DeliveryReceipt::parse("stat:EXPIRED   id:9 text:bye now");
        assert_eq!(parsed.to_string(), "id:9 stat:EXPIRED text:bye now");
        assert_eq!(DeliveryReceipt::parse(&parsed.to_string()), parsed);
    }
}
