use crate::error::Result;

/// A playable reference to one uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef {
    /// URL handed to the media element (an object URL in the browser).
    pub src: String,
    /// Original file name, shown as the track label.
    pub name: String,
}

/// Ordered, append-only list of uploaded tracks. Duplicates are allowed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Playlist {
    entries: Vec<MediaRef>,
}

impl Playlist {
    pub fn push(&mut self, entry: MediaRef) {
        self.entries.push(entry);
    }

    pub fn get(&self, index: usize) -> Option<&MediaRef> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[MediaRef] {
        &self.entries
    }
}

impl FromIterator<MediaRef> for Playlist {
    fn from_iter<I: IntoIterator<Item = MediaRef>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Holds the file picked in the upload control until it is confirmed.
#[derive(Debug)]
pub struct Uploader<F> {
    pending: Option<F>,
}

impl<F> Default for Uploader<F> {
    fn default() -> Self {
        Self { pending: None }
    }
}

impl<F> Uploader<F> {
    /// Replace the pending selection. A cancelled picker passes `None`.
    pub fn select(&mut self, file: Option<F>) {
        self.pending = file;
    }

    pub fn pending(&self) -> Option<&F> {
        self.pending.as_ref()
    }

    /// Append the pending file to `playlist` and clear it.
    ///
    /// Returns `Ok(false)` when nothing was selected. If `to_ref` fails the
    /// selection is kept so the user can retry.
    pub fn confirm(
        &mut self,
        playlist: &mut Playlist,
        to_ref: impl FnOnce(&F) -> Result<MediaRef>,
    ) -> Result<bool> {
        let Some(file) = self.pending.as_ref() else {
            return Ok(false);
        };
        let entry = to_ref(file)?;
        playlist.push(entry);
        self.pending = None;
        Ok(true)
    }
}
