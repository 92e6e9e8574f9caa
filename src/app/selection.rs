use std::collections::HashSet;

/// Which café is expanded and which one shows a hover preview.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct SelectionState {
    pub(crate) selected: Option<String>,
    pub(crate) hovered: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum SelectionAction {
    /// Click on a café: toggles it, or switches to it.
    Select(String),
    /// Pointer moved over a café, or off every café.
    Hover(Option<String>),
    /// Click on the background.
    Deselect,
    /// The dataset was replaced; these ids still exist.
    DatasetReloaded(HashSet<String>),
}

impl SelectionState {
    pub(crate) fn reduce(self, action: SelectionAction) -> Self {
        match action {
            SelectionAction::Select(id) => {
                let selected = if self.selected.as_deref() == Some(id.as_str()) {
                    None
                } else {
                    Some(id)
                };
                Self {
                    selected,
                    hovered: None,
                }
            }
            SelectionAction::Hover(hovered) => {
                if self.selected.is_some() {
                    Self {
                        hovered: None,
                        ..self
                    }
                } else {
                    Self { hovered, ..self }
                }
            }
            SelectionAction::Deselect => Self::default(),
            SelectionAction::DatasetReloaded(known) => Self {
                selected: self.selected.filter(|id| known.contains(id)),
                hovered: self.hovered.filter(|id| known.contains(id)),
            },
        }
    }

    /// In-place convenience for the view model.
    pub(crate) fn dispatch(&mut self, action: SelectionAction) -> bool {
        let previous = std::mem::take(self);
        let next = previous.clone().reduce(action);
        let changed = next != previous;
        *self = next;
        changed
    }

    /// The café whose preview tooltip should be drawn.
    pub(crate) fn preview(&self) -> Option<&str> {
        if self.selected.is_some() {
            None
        } else {
            self.hovered.as_deref()
        }
    }
}
