//! Ordered talk list with a selection

use talk_api::{Talk, TalkId};

/// The talks shown to the user, in display order, plus the selected one.
///
/// The selection is `None` only while the list is empty or a new talk is
/// being created.
#[derive(Debug, Default)]
pub struct TalkStore {
    talks: Vec<Talk>,
    selected: Option<usize>,
}

impl TalkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All talks in display order
    pub fn list(&self) -> &[Talk] {
        &self.talks
    }

    pub fn len(&self) -> usize {
        self.talks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.talks.is_empty()
    }

    /// Replace every talk, selecting the first one
    pub fn replace_all(&mut self, talks: Vec<Talk>) {
        self.selected = if talks.is_empty() { None } else { Some(0) };
        self.talks = talks;
    }

    /// Append a talk and select it, returning its index
    pub fn add(&mut self, talk: Talk) -> usize {
        self.talks.push(talk);
        let index = self.talks.len() - 1;
        self.selected = Some(index);
        index
    }

    /// Remove the talk at `index`.
    ///
    /// Removing the selected talk or one before it moves the selection back
    /// by one, stopping at the first talk. Removing a talk after the
    /// selection leaves the same talk selected rather than moving back.
    pub fn remove(&mut self, index: usize) -> Option<Talk> {
        if index >= self.talks.len() {
            return None;
        }
        let talk = self.talks.remove(index);

        self.selected = match self.selected {
            Some(selected) if index <= selected => Some(selected.saturating_sub(1)),
            other => other,
        };
        if self.talks.is_empty() {
            self.selected = None;
        } else if let Some(selected) = self.selected {
            self.selected = Some(selected.min(self.talks.len() - 1));
        }
        Some(talk)
    }

    /// Select the talk at `index`; returns false if there is none
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.talks.len() {
            return false;
        }
        self.selected = Some(index);
        true
    }

    /// Clear the selection
    pub fn deselect(&mut self) {
        self.selected = None;
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected(&self) -> Option<&Talk> {
        self.selected.and_then(|i| self.talks.get(i))
    }

    pub fn selected_mut(&mut self) -> Option<&mut Talk> {
        self.selected.and_then(|i| self.talks.get_mut(i))
    }

    pub fn find(&self, id: &TalkId) -> Option<&Talk> {
        self.talks.iter().find(|t| &t.id == id)
    }

    pub fn find_mut(&mut self, id: &TalkId) -> Option<&mut Talk> {
        self.talks.iter_mut().find(|t| &t.id == id)
    }
}
