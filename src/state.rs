use serde::{Deserialize, Serialize};

use crate::error::{MeterError, Result};

/// Flat record of a meter's configuration, value and size, saved across a
/// host suspend/resume cycle.
///
/// Colours are ARGB bit patterns. The label is not part of the record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SavedState {
    pub background_color: i32,
    pub border_color: i32,
    pub mark_color: i32,
    pub indicator_color: i32,
    pub text_color: i32,

    pub border_width: f32,
    pub mark_width: f32,
    pub indicator_width: f32,

    pub width: i32,
    pub height: i32,

    pub min_value: f32,
    pub max_value: f32,
    pub value: f32,

    pub text_size: i32,
    pub font_id: i32,
    pub mark_parts: i32,
}

impl SavedState {
    /// Sixteen 4-byte fields.
    pub const ENCODED_LEN: usize = 64;

    /// Encodes every field as 4 little-endian bytes in declaration order.
    pub fn to_bytes(&self) -> [u8; Self::ENCODED_LEN] {
        let words: [[u8; 4]; 16] = [
            self.background_color.to_le_bytes(),
            self.border_color.to_le_bytes(),
            self.mark_color.to_le_bytes(),
            self.indicator_color.to_le_bytes(),
            self.text_color.to_le_bytes(),
            self.border_width.to_le_bytes(),
            self.mark_width.to_le_bytes(),
            self.indicator_width.to_le_bytes(),
            self.width.to_le_bytes(),
            self.height.to_le_bytes(),
            self.min_value.to_le_bytes(),
            self.max_value.to_le_bytes(),
            self.value.to_le_bytes(),
            self.text_size.to_le_bytes(),
            self.font_id.to_le_bytes(),
            self.mark_parts.to_le_bytes(),
        ];
        let mut out = [0u8; Self::ENCODED_LEN];
        for (chunk, word) in out.chunks_exact_mut(4).zip(words) {
            chunk.copy_from_slice(&word);
        }
        out
    }

    /// Decodes a record written by [`SavedState::to_bytes`]. Trailing bytes
    /// are ignored.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::ENCODED_LEN {
            return Err(MeterError::TruncatedState {
                expected: Self::ENCODED_LEN,
                actual: bytes.len(),
            });
        }
        let mut fields = FieldReader(bytes.chunks_exact(4));
        // Struct fields evaluate in source order, which is the wire order.
        Ok(Self {
            background_color: fields.int(),
            border_color: fields.int(),
            mark_color: fields.int(),
            indicator_color: fields.int(),
            text_color: fields.int(),
            border_width: fields.float(),
            mark_width: fields.float(),
            indicator_width: fields.float(),
            width: fields.int(),
            height: fields.int(),
            min_value: fields.float(),
            max_value: fields.float(),
            value: fields.float(),
            text_size: fields.int(),
            font_id: fields.int(),
            mark_parts: fields.int(),
        })
    }
}

struct FieldReader<'a>(std::slice::ChunksExact<'a, u8>);

impl FieldReader<'_> {
    fn word(&mut self) -> [u8; 4] {
        self.0
            .next()
            .and_then(|chunk| chunk.try_into().ok())
            .unwrap_or_default()
    }

    fn int(&mut self) -> i32 {
        i32::from_le_bytes(self.word())
    }

    fn float(&mut self) -> f32 {
        f32::from_le_bytes(self.word())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SavedState {
        SavedState {
            background_color: -1,
            border_color: -16777216,
            mark_color: -16711936,
            indicator_color: 0x1234_5678,
            text_color: -16776961,
            border_width: 4.0,
            mark_width: 1.5,
            indicator_width: 4.25,
            width: 480,
            height: 480,
            min_value: -10.0,
            max_value: 90.5,
            value: 33.3,
            text_size: 80,
            font_id: 7,
            mark_parts: 10,
        }
    }

    #[test]
    fn bytes_round_trip_field_for_field() {
        let state = sample();
        let bytes = state.to_bytes();
        assert_eq!(bytes.len(), SavedState::ENCODED_LEN);
        assert_eq!(SavedState::from_bytes(&bytes).unwrap(), state);
    }

    #[test]
    fn fields_are_written_in_record_order() {
        let bytes = sample().to_bytes();
        assert_eq!(&bytes[0..4], &(-1i32).to_le_bytes());
        assert_eq!(&bytes[12..16], &0x1234_5678i32.to_le_bytes());
        assert_eq!(&bytes[20..24], &4.0f32.to_le_bytes());
        assert_eq!(&bytes[32..36], &480i32.to_le_bytes());
        assert_eq!(&bytes[40..44], &(-10.0f32).to_le_bytes());
        assert_eq!(&bytes[48..52], &33.3f32.to_le_bytes());
        assert_eq!(&bytes[52..56], &80i32.to_le_bytes());
        assert_eq!(&bytes[56..60], &7i32.to_le_bytes());
        assert_eq!(&bytes[60..64], &10i32.to_le_bytes());
    }

    #[test]
    fn truncated_input_is_rejected() {
        let bytes = sample().to_bytes();
        assert!(matches!(
            SavedState::from_bytes(&bytes[..63]),
            Err(MeterError::TruncatedState {
                expected: 64,
                actual: 63
            })
        ));
        assert!(SavedState::from_bytes(&[]).is_err());
    }

    #[test]
    fn serde_round_trip_through_toml() {
        let state = sample();
        let text = toml::to_string(&state).unwrap();
        assert!(text.contains("mark_parts = 10"));
        assert!(text.contains("background_color = -1"));
        let decoded: SavedState = toml::from_str(&text).unwrap();
        assert_eq!(decoded, state);
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let mut bytes = sample().to_bytes().to_vec();
        bytes.extend_from_slice(&[0xaa; 8]);
        assert_eq!(SavedState::from_bytes(&bytes).unwrap(), sample());
    }
}
