/// The fixed set of keys a controller script can observe.
///
/// Bit values are part of the script contract: the `KEY` table exposed to
/// Lua carries these exact encodings, so they must never be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u64)]
pub enum CamKey {
    Left = 1 << 0,
    Right = 1 << 1,
    Up = 1 << 2,
    Down = 1 << 3,
    Space = 1 << 4,
    LCtrl = 1 << 5,
    LShift = 1 << 6,
    Tab = 1 << 7,
    Esc = 1 << 8,
}

impl CamKey {
    /// Every named key, in bit order.
    pub const ALL: [CamKey; 9] = [
        CamKey::Left,
        CamKey::Right,
        CamKey::Up,
        CamKey::Down,
        CamKey::Space,
        CamKey::LCtrl,
        CamKey::LShift,
        CamKey::Tab,
        CamKey::Esc,
    ];

    /// The key's bit in a [`KeyMask`].
    pub fn bit(self) -> u64 {
        self as u64
    }

    /// Script-visible constant name for this key.
    pub fn name(self) -> &'static str {
        match self {
            CamKey::Left => "LEFT",
            CamKey::Right => "RIGHT",
            CamKey::Up => "UP",
            CamKey::Down => "DOWN",
            CamKey::Space => "SPACE",
            CamKey::LCtrl => "LCTRL",
            CamKey::LShift => "LSHIFT",
            CamKey::Tab => "TAB",
            CamKey::Esc => "ESC",
        }
    }
}

/// Bitset snapshot of which named keys are held down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyMask(pub u64);

impl KeyMask {
    pub const EMPTY: KeyMask = KeyMask(0);

    pub fn insert(&mut self, key: CamKey) {
        self.0 |= key.bit();
    }

    pub fn remove(&mut self, key: CamKey) {
        self.0 &= !key.bit();
    }

    pub fn contains(self, key: CamKey) -> bool {
        self.0 & key.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Raw bits, identical to what scripts see in the input record.
    pub fn bits(self) -> u64 {
        self.0
    }
}

impl From<CamKey> for KeyMask {
    fn from(key: CamKey) -> Self {
        KeyMask(key.bit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_encoding_is_stable() {
        // Script contract: LEFT..ESC occupy bits 0..8 in declaration order.
        for (i, key) in CamKey::ALL.iter().enumerate() {
            assert_eq!(key.bit(), 1 << i, "{} moved", key.name());
        }
    }

    #[test]
    fn names_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for key in CamKey::ALL {
            assert!(seen.insert(key.name()));
        }
    }

    #[test]
    fn mask_insert_remove_contains() {
        let mut mask = KeyMask::EMPTY;
        assert!(mask.is_empty());

        mask.insert(CamKey::Left);
        mask.insert(CamKey::Tab);
        assert!(mask.contains(CamKey::Left));
        assert!(mask.contains(CamKey::Tab));
        assert!(!mask.contains(CamKey::Esc));

        mask.remove(CamKey::Left);
        assert!(!mask.contains(CamKey::Left));
        assert!(mask.contains(CamKey::Tab));
    }
}
