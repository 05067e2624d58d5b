//! Mapping from key presses to label tokens.

use minifb::Key;

/// An explicit finite enumeration from keys to label tokens.
///
/// The map is constructed up front and passed to the capture loop as
/// configuration; keys outside the map are ignored by the recorder. `Escape`
/// is reserved as the quit key and never appears in a map.
pub struct KeyMap {
    entries: Vec<(Key, String)>,
}

/// The full alphanumeric key table: 26 letters and 10 digits.
const ALPHANUMERIC: &[(Key, &str)] = &[
    (Key::A, "A"),
    (Key::B, "B"),
    (Key::C, "C"),
    (Key::D, "D"),
    (Key::E, "E"),
    (Key::F, "F"),
    (Key::G, "G"),
    (Key::H, "H"),
    (Key::I, "I"),
    (Key::J, "J"),
    (Key::K, "K"),
    (Key::L, "L"),
    (Key::M, "M"),
    (Key::N, "N"),
    (Key::O, "O"),
    (Key::P, "P"),
    (Key::Q, "Q"),
    (Key::R, "R"),
    (Key::S, "S"),
    (Key::T, "T"),
    (Key::U, "U"),
    (Key::V, "V"),
    (Key::W, "W"),
    (Key::X, "X"),
    (Key::Y, "Y"),
    (Key::Z, "Z"),
    (Key::Key0, "0"),
    (Key::Key1, "1"),
    (Key::Key2, "2"),
    (Key::Key3, "3"),
    (Key::Key4, "4"),
    (Key::Key5, "5"),
    (Key::Key6, "6"),
    (Key::Key7, "7"),
    (Key::Key8, "8"),
    (Key::Key9, "9"),
];

impl KeyMap {
    /// The full variant: A–Z and 0–9, each mapped to its own token.
    pub fn alphanumeric() -> Self {
        Self {
            entries: ALPHANUMERIC
                .iter()
                .map(|(key, label)| (*key, label.to_string()))
                .collect(),
        }
    }

    /// A single-label variant: every mapped key records the same token.
    pub fn single(label: &str) -> Self {
        Self {
            entries: vec![(Key::Space, label.to_string())],
        }
    }

    /// Returns the label token for `key`, or [`None`] if the key is not part
    /// of the map.
    pub fn label_for(&self, key: Key) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, label)| label.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alphanumeric_covers_letters_and_digits() {
        let map = KeyMap::alphanumeric();
        assert_eq!(map.len(), 36);
        assert_eq!(map.label_for(Key::A), Some("A"));
        assert_eq!(map.label_for(Key::Z), Some("Z"));
        assert_eq!(map.label_for(Key::Key0), Some("0"));
        assert_eq!(map.label_for(Key::Key9), Some("9"));
    }

    #[test]
    fn unmapped_keys_yield_none() {
        let map = KeyMap::alphanumeric();
        assert_eq!(map.label_for(Key::Comma), None);
        assert_eq!(map.label_for(Key::Escape), None);
        assert_eq!(map.label_for(Key::Space), None);
    }

    #[test]
    fn single_label_variant() {
        let map = KeyMap::single("A");
        assert_eq!(map.label_for(Key::Space), Some("A"));
        assert_eq!(map.label_for(Key::A), None);
    }
}
