// SPDX-License-Identifier: GPL-3.0-only

//! Application state management
//!
//! The UI state is an explicit enum; which controls are shown is a pure
//! projection of it so front ends never track visibility themselves.

/// UI state machine
///
/// ```text
///        open camera            take photo
/// Idle ───────────────▶ CameraActive ───────────▶ PhotoTaken
///   ▲                     │  ▲  ▲ flip              │
///   └── open/flip fails ──┘  │  └──┘                │
///                            └──────── retake ──────┘
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum UiState {
    /// No camera open
    #[default]
    Idle,
    /// Live stream open (or being negotiated)
    CameraActive,
    /// A photo was just captured and is on display
    PhotoTaken,
}

impl UiState {
    /// State an intent requires; intents in any other state are ignored
    pub fn accepts(self, intent: Intent) -> bool {
        matches!(
            (self, intent),
            (UiState::Idle, Intent::OpenCamera)
                | (UiState::CameraActive, Intent::TakePhoto)
                | (UiState::CameraActive, Intent::FlipCamera)
                | (UiState::PhotoTaken, Intent::RetakePhoto)
        )
    }
}

impl std::fmt::Display for UiState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UiState::Idle => write!(f, "idle"),
            UiState::CameraActive => write!(f, "camera active"),
            UiState::PhotoTaken => write!(f, "photo taken"),
        }
    }
}

/// User intents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    OpenCamera,
    TakePhoto,
    RetakePhoto,
    FlipCamera,
}

/// A control or surface a front end may show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Control {
    OpenCamera,
    LivePreview,
    TakePhoto,
    FlipCamera,
    PhotoDisplay,
    RetakePhoto,
    Gallery,
}

/// Set of visible controls
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlSet(Vec<Control>);

impl ControlSet {
    fn of(controls: &[Control]) -> Self {
        Self(controls.to_vec())
    }

    pub fn contains(&self, control: Control) -> bool {
        self.0.contains(&control)
    }

    pub fn iter(&self) -> impl Iterator<Item = Control> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Add the gallery surface
    pub fn with_gallery(mut self) -> Self {
        if !self.contains(Control::Gallery) {
            self.0.push(Control::Gallery);
        }
        self
    }
}

/// Controls visible in `state`
pub fn visible_controls(state: UiState) -> ControlSet {
    match state {
        UiState::Idle => ControlSet::of(&[Control::OpenCamera]),
        UiState::CameraActive => ControlSet::of(&[
            Control::LivePreview,
            Control::TakePhoto,
            Control::FlipCamera,
        ]),
        UiState::PhotoTaken => ControlSet::of(&[Control::PhotoDisplay, Control::RetakePhoto]),
    }
}
