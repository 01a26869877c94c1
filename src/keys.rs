// src/keys.rs
//
// Static key -> pitch table.

/// One playable key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Key {
    /// Identifier used by the page (element id) and in recordings.
    pub id: &'static str,

    /// Fixed pitch in Hz.
    pub pitch: f32,
}

impl Key {
    const fn new(id: &'static str, pitch: f32) -> Self {
        Self { id, pitch }
    }
}

/// White keys from C4 to C7, in display order.
pub static KEYS: [Key; 22] = [
    Key::new("C4", 261.625),
    Key::new("D4", 293.665),
    Key::new("E4", 329.628),
    Key::new("F4", 349.228),
    Key::new("G4", 391.995),
    Key::new("A4", 440.0),
    Key::new("B4", 493.883),
    Key::new("C5", 523.251),
    Key::new("D5", 587.33),
    Key::new("E5", 659.25),
    Key::new("F5", 698.46),
    Key::new("G5", 783.99),
    Key::new("A5", 880.0),
    Key::new("B5", 987.77),
    Key::new("C6", 1046.5),
    Key::new("D6", 1174.66),
    Key::new("E6", 1318.51),
    Key::new("F6", 1396.91),
    Key::new("G6", 1567.98),
    Key::new("A6", 1760.0),
    Key::new("B6", 1975.53),
    Key::new("C7", 2093.0),
];

/// Look up a key by id.
#[inline]
pub fn find(id: &str) -> Option<&'static Key> {
    KEYS.iter().find(|k| k.id == id)
}

/// Pitch of a key, or `None` for ids outside the table.
#[inline]
pub fn pitch_of(id: &str) -> Option<f32> {
    find(id).map(|k| k.pitch)
}

/// Iterate keys in table order.
pub fn iter() -> impl Iterator<Item = &'static Key> {
    KEYS.iter()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_order_and_bounds() {
        let ids: Vec<_> = iter().map(|k| k.id).collect();
        assert_eq!(ids.len(), 22);
        assert_eq!(ids.first(), Some(&"C4"));
        assert_eq!(ids.last(), Some(&"C7"));
    }

    #[test]
    fn test_pitches_ascend() {
        for pair in KEYS.windows(2) {
            assert!(pair[0].pitch < pair[1].pitch, "{} >= {}", pair[0].id, pair[1].id);
        }
    }

    #[test]
    fn test_lookup() {
        assert_eq!(pitch_of("A4"), Some(440.0));
        assert_eq!(pitch_of("A5"), Some(880.0));
        assert_eq!(pitch_of("H9"), None);
        assert_eq!(pitch_of(""), None);
        assert!(find("c4").is_none());
    }
}
