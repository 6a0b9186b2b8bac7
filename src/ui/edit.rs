/// Per-item title editing
///
/// Each rendered album or photo carries its own edit state. This is view
/// state only: the store never sees a draft, just the committed title.

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditState {
    #[default]
    Viewing,
    Editing { draft_title: String },
}

impl EditState {
    /// Start editing with the current title as the draft
    pub fn begin(current_title: &str) -> Self {
        EditState::Editing {
            draft_title: current_title.to_string(),
        }
    }

    pub fn is_editing(&self) -> bool {
        matches!(self, EditState::Editing { .. })
    }

    pub fn draft(&self) -> Option<&str> {
        match self {
            EditState::Editing { draft_title } => Some(draft_title),
            EditState::Viewing => None,
        }
    }

    /// Replace the draft. Ignored while viewing.
    pub fn set_draft(&mut self, value: String) {
        if let EditState::Editing { draft_title } = self {
            *draft_title = value;
        }
    }

    /// Finish editing and return the draft to save, as typed.
    /// A blank draft reverts: nothing is returned and the old title stays.
    pub fn commit(&mut self) -> Option<String> {
        match std::mem::take(self) {
            EditState::Editing { draft_title } => {
                (!draft_title.trim().is_empty()).then_some(draft_title)
            }
            EditState::Viewing => None,
        }
    }

    /// Drop the draft
    pub fn cancel(&mut self) {
        *self = EditState::Viewing;
    }
}
