//! # Key bindings
//!
//! A fixed table of one [`Binding`] per [`Action`], stored on disk as raw bytes. Action ids index
//! the table and are part of the file format, so they are never reused.

/// Something the user can bind a key to.
///
/// Discriminants are the on-disk ids. Press-and-release actions have a matching `*Release`
/// action, fired when the bound key comes back up.
#[derive(
    Copy, Clone, PartialEq, Eq, Hash, Debug, strum::EnumIter, strum::FromRepr, strum::AsRefStr,
)]
#[repr(u32)]
pub enum Action {
    DecreaseBrushSize = 1,
    IncreaseBrushSize = 2,
    ZoomIn = 3,
    ZoomOut = 4,
    Redo = 5,
    Undo = 6,
    Export = 7,
    Quit = 8,
    New = 9,
    Save = 10,
    SaveAs = 11,
    Open = 12,
    ToggleMenu = 13,
    ToggleGui = 14,
    ModeEraser = 15,
    ModePen = 16,
    ModeEyedropper = 17,
    ModeLine = 18,
    ModeRectangle = 19,
    ModeGrid = 20,
    BrushAlpha10 = 21,
    BrushAlpha20 = 22,
    BrushAlpha30 = 23,
    BrushAlpha40 = 24,
    BrushAlpha50 = 25,
    BrushAlpha60 = 26,
    BrushAlpha70 = 27,
    BrushAlpha80 = 28,
    BrushAlpha90 = 29,
    BrushAlpha100 = 30,
    Help = 31,
    PeekOut = 32,
    DragBrushSize = 33,
    DragZoom = 34,
    Transform = 35,
    // 36 is the end of the press-only range, and is never bound.
    PeekOutRelease = 37,
    DragBrushSizeRelease = 38,
    DragZoomRelease = 39,
    TransformRelease = 40,
}
impl Action {
    /// Number of slots in a [`Bindings`] table, including the unused slots 0 and 36.
    pub const SLOTS: usize = 41;

    /// The action fired on key release, for press-and-release actions.
    #[must_use]
    pub fn release(self) -> Option<Self> {
        match self {
            Self::PeekOut => Some(Self::PeekOutRelease),
            Self::DragBrushSize => Some(Self::DragBrushSizeRelease),
            Self::DragZoom => Some(Self::DragZoomRelease),
            Self::Transform => Some(Self::TransformRelease),
            _ => None,
        }
    }
    #[must_use]
    pub fn is_release(self) -> bool {
        matches!(
            self,
            Self::PeekOutRelease
                | Self::DragBrushSizeRelease
                | Self::DragZoomRelease
                | Self::TransformRelease
        )
    }
    /// Set-brush-alpha actions for `'1'..='9', '0'`, in key order.
    const ALPHAS: [Self; 10] = [
        Self::BrushAlpha10,
        Self::BrushAlpha20,
        Self::BrushAlpha30,
        Self::BrushAlpha40,
        Self::BrushAlpha50,
        Self::BrushAlpha60,
        Self::BrushAlpha70,
        Self::BrushAlpha80,
        Self::BrushAlpha90,
        Self::BrushAlpha100,
    ];
}

bitflags::bitflags! {
    #[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, bytemuck::Pod, bytemuck::Zeroable)]
    #[repr(transparent)]
    pub struct Modifiers : u32 {
        const CTRL = 1;
        const WIN = 1 << 1;
        const ALT = 1 << 2;
        const SPACE = 1 << 3;
        const SHIFT = 1 << 4;
    }
}

/// A bound key. Positive values are ASCII, zero is no key, negatives are function keys.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(transparent)]
pub struct Key(pub i8);
impl Key {
    /// Only the modifiers matter.
    pub const UNBOUND: Self = Self(0);
    pub const TAB: Self = Self(b'\t' as i8);
    pub const ESC: Self = Self(27);
    #[rustfmt::skip]
    pub const F: [Self; 12] = [
        Self(-2), Self(-3), Self(-4), Self(-5), Self(-6), Self(-7),
        Self(-8), Self(-9), Self(-10), Self(-11), Self(-12), Self(-13),
    ];

    /// The key for an ASCII character, or `None` for anything outside of ASCII.
    #[must_use]
    pub const fn ascii(c: char) -> Option<Self> {
        if c.is_ascii() && c != '\0' {
            // Checked ASCII, fits in 7 bits.
            Some(Self(c as u8 as i8))
        } else {
            None
        }
    }
    /// Function key `n`, 1-based.
    #[must_use]
    pub fn function(n: usize) -> Option<Self> {
        Self::F.get(n.checked_sub(1)?).copied()
    }
}

/// One entry of the binding table, laid out exactly as stored on disk.
#[derive(Copy, Clone, PartialEq, Eq, Debug, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct Binding {
    pub accepts_repeats: u8,
    pub on_release: u8,
    pub _padding1: [u8; 2],
    pub modifiers: Modifiers,
    pub key: Key,
    pub _padding2: [u8; 3],
    /// Raw [`Action`] id, zero for an empty slot.
    pub action: u32,
}
impl Binding {
    pub const SIZE: usize = std::mem::size_of::<Self>();
    pub const EMPTY: Self = Self {
        accepts_repeats: 0,
        on_release: 0,
        _padding1: [0; 2],
        modifiers: Modifiers::empty(),
        key: Key::UNBOUND,
        _padding2: [0; 3],
        action: 0,
    };

    #[must_use]
    pub fn new(modifiers: Modifiers, key: Key, action: Action) -> Self {
        Self {
            modifiers,
            key,
            action: action as u32,
            ..Self::EMPTY
        }
    }
    #[must_use]
    pub fn repeatable(self) -> Self {
        Self {
            accepts_repeats: 1,
            ..self
        }
    }
    /// The action this binding fires, if the stored id is known.
    #[must_use]
    pub fn action(&self) -> Option<Action> {
        Action::from_repr(self.action)
    }
    #[must_use]
    pub fn accepts_repeats(&self) -> bool {
        self.accepts_repeats != 0
    }
    #[must_use]
    pub fn on_release(&self) -> bool {
        self.on_release != 0
    }
}

/// The binding table, indexed by [`Action`] id.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Bindings(pub [Binding; Action::SLOTS]);
impl Bindings {
    /// Byte length of the table on disk.
    pub const SIZE: usize = Binding::SIZE * Action::SLOTS;

    #[must_use]
    pub fn empty() -> Self {
        Self([Binding::EMPTY; Action::SLOTS])
    }
    #[must_use]
    pub fn get(&self, action: Action) -> &Binding {
        // Discriminants are all below `SLOTS`.
        &self.0[action as usize]
    }
    /// Bind `action`. For press-and-release actions, also binds the release.
    pub fn bind(&mut self, binding: Binding) {
        let Some(action) = binding.action() else {
            return;
        };
        self.0[action as usize] = binding;
        if let Some(release) = action.release() {
            self.0[release as usize] = Binding {
                on_release: 1,
                action: release as u32,
                ..binding
            };
        }
    }
    /// Find the action bound to a key press.
    #[must_use]
    pub fn lookup(&self, modifiers: Modifiers, key: Key, on_release: bool) -> Option<Action> {
        self.0
            .iter()
            .find(|binding| {
                binding.action != 0
                    && binding.modifiers == modifiers
                    && binding.key == key
                    && binding.on_release() == on_release
            })
            .and_then(Binding::action)
    }
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.0[..])
    }
}
impl Default for Bindings {
    fn default() -> Self {
        let mut bindings = Self::empty();
        let ctrl = Modifiers::CTRL;
        let none = Modifiers::empty();
        // ASCII literals below are all valid keys.
        let key = |c: char| Key::ascii(c).unwrap_or(Key::UNBOUND);

        for (modifiers, c, action) in [
            (ctrl, 'z', Action::Undo),
            (ctrl | Modifiers::SHIFT, 'z', Action::Redo),
            (none, '[', Action::DecreaseBrushSize),
            (none, ']', Action::IncreaseBrushSize),
            (ctrl, '=', Action::ZoomIn),
            (ctrl, '-', Action::ZoomOut),
        ] {
            bindings.bind(Binding::new(modifiers, key(c), action).repeatable());
        }

        for (modifiers, c, action) in [
            (ctrl, 'e', Action::Export),
            (ctrl, 'q', Action::Quit),
            (ctrl, 'n', Action::New),
            (ctrl, 'o', Action::Open),
            (ctrl | Modifiers::SHIFT, 's', Action::SaveAs),
            (none, 'm', Action::ToggleMenu),
            (none, 'e', Action::ModeEraser),
            (none, 'b', Action::ModePen),
            (none, 'i', Action::ModeEyedropper),
            (none, 'l', Action::ModeLine),
            (none, 'r', Action::ModeRectangle),
            (none, 'g', Action::ModeGrid),
            (none, '`', Action::PeekOut),
        ] {
            bindings.bind(Binding::new(modifiers, key(c), action));
        }
        bindings.bind(Binding::new(none, Key::F[0], Action::Help));
        bindings.bind(Binding::new(none, Key::TAB, Action::ToggleGui));

        for (c, action) in "1234567890".chars().zip(Action::ALPHAS) {
            bindings.bind(Binding::new(none, key(c), action));
        }

        bindings.bind(Binding::new(Modifiers::SHIFT, Key::UNBOUND, Action::DragBrushSize));
        bindings.bind(Binding::new(Modifiers::ALT, Key::UNBOUND, Action::Transform));
        bindings.bind(Binding::new(ctrl, Key::UNBOUND, Action::DragZoom));

        bindings
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn layout() {
        assert_eq!(Binding::SIZE, 16);
        assert_eq!(Bindings::SIZE, 656);
        assert!(Action::iter().all(|action| (action as usize) < Action::SLOTS));
    }
    #[test]
    fn release_pairs() {
        let bindings = Bindings::default();
        let peek = bindings.get(Action::PeekOutRelease);
        assert!(peek.on_release());
        assert_eq!(peek.key, Key::ascii('`').unwrap());
        assert_eq!(peek.action(), Some(Action::PeekOutRelease));
        assert_eq!(
            bindings.lookup(Modifiers::ALT, Key::UNBOUND, true),
            Some(Action::TransformRelease)
        );
        assert_eq!(
            bindings.lookup(Modifiers::ALT, Key::UNBOUND, false),
            Some(Action::Transform)
        );
    }
    #[test]
    fn defaults() {
        let bindings = Bindings::default();
        // Every bindable action besides `Save` has a default.
        for action in Action::iter().filter(|action| *action != Action::Save) {
            assert_eq!(
                bindings.get(action).action(),
                Some(action),
                "{} unbound",
                action.as_ref()
            );
        }
        assert_eq!(bindings.get(Action::Save).action(), None);
        assert!(bindings.get(Action::Undo).accepts_repeats());
        assert!(!bindings.get(Action::Export).accepts_repeats());
        assert_eq!(
            bindings.lookup(Modifiers::empty(), Key::ascii('0').unwrap(), false),
            Some(Action::BrushAlpha100)
        );
        assert_eq!(
            bindings.lookup(Modifiers::empty(), Key::function(1).unwrap(), false),
            Some(Action::Help)
        );
    }
    #[test]
    fn unknown_action_is_none() {
        let binding = Binding {
            action: 36,
            ..Binding::EMPTY
        };
        assert_eq!(binding.action(), None);
        let mut bindings = Bindings::empty();
        bindings.bind(binding);
        assert_eq!(bindings, Bindings::empty());
    }
}
