use derive_setters::Setters;
use serde::{Deserialize, Serialize};

/// Options shared by [`Decoder`](crate::Decoder) and
/// [`unmarshal_with`](crate::unmarshal_with).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Setters)]
#[serde(rename_all = "camelCase", default)]
pub struct DecoderConfig {
    /// Reject object fields that the target type does not declare.
    pub strict: bool,
    /// Bytes kept on each side of a failure in the short excerpt.
    pub peek_radius: usize,
    /// Bytes kept on each side of a failure in the bigger context.
    pub context_radius: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self { strict: false, peek_radius: 10, context_radius: 50 }
    }
}

impl DecoderConfig {
    /// Number of recently read bytes a stream decoder retains for excerpts.
    pub(crate) fn window(&self) -> usize {
        self.peek_radius.max(self.context_radius)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let fixture = json!({"strict": true, "peekRadius": 4});
        let actual: DecoderConfig = serde_json::from_value(fixture).unwrap();
        let expected = DecoderConfig::default().strict(true).peek_radius(4usize);
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_window_covers_both_excerpts() {
        let fixture = DecoderConfig::default().peek_radius(80usize);
        let actual = fixture.window();
        let expected = 80;
        assert_eq!(actual, expected);
    }
}
