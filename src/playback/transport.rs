/// Direction for skipping through the playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipDirection {
    Previous,
    Next,
}

impl SkipDirection {
    pub fn offset(self) -> isize {
        match self {
            SkipDirection::Previous => -1,
            SkipDirection::Next => 1,
        }
    }
}

/// Wraps `current + offset` into `[0, len)`; Previous from 0 lands on the last track.
pub fn wrap_index(current: usize, offset: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    (current as isize + offset).rem_euclid(len as isize) as usize
}

/// User-issued transport commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportCommand {
    Previous,
    TogglePlay,
    Next,
}

/// Modifier state for a key press.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyModifiers {
    pub ctrl_or_meta: bool,
    pub alt: bool,
    pub shift: bool,
}

impl TransportCommand {
    /// Maps a keyboard `key`/`code` pair to a command.
    pub fn from_key(key: &str, code: &str, modifiers: KeyModifiers) -> Option<Self> {
        match key {
            "MediaTrackNext" | "MediaNextTrack" | "AudioTrackNext" => return Some(Self::Next),
            "MediaTrackPrevious" | "MediaPreviousTrack" | "AudioTrackPrevious" => {
                return Some(Self::Previous)
            }
            "MediaPlayPause" | "AudioPlay" | "AudioPause" => return Some(Self::TogglePlay),
            _ => {}
        }
        match code {
            "MediaTrackNext" => return Some(Self::Next),
            "MediaTrackPrevious" => return Some(Self::Previous),
            "MediaPlayPause" => return Some(Self::TogglePlay),
            _ => {}
        }

        if modifiers.ctrl_or_meta && !modifiers.alt && !modifiers.shift {
            match key {
                "ArrowRight" => return Some(Self::Next),
                "ArrowLeft" => return Some(Self::Previous),
                _ => {}
            }
        }

        let bare = !modifiers.ctrl_or_meta && !modifiers.alt;
        if bare && (key == " " || key == "Spacebar" || code == "Space") {
            return Some(Self::TogglePlay);
        }

        None
    }
}
