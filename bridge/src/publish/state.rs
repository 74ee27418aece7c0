/// Whether the last notification on a channel carried content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PublishState {
    /// Nothing published yet, or the last notification was the empty one.
    #[default]
    Idle,
    /// The last notification carried content.
    Active,
}

/// What to write for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emission {
    /// Suppressed: still empty.
    Nothing,
    /// The explicit empty notification.
    Cleared,
    /// A content notification.
    Content,
}

impl PublishState {
    /// Apply one frame and return what must be written.
    ///
    /// ```text
    /// IDLE   --empty-->     IDLE    (nothing)
    /// IDLE   --non-empty--> ACTIVE  (content)
    /// ACTIVE --empty-->     IDLE    (cleared)
    /// ACTIVE --non-empty--> ACTIVE  (content)
    /// ```
    pub fn advance(&mut self, has_content: bool) -> Emission {
        let (next, emission) = match (*self, has_content) {
            (PublishState::Idle, false) => (PublishState::Idle, Emission::Nothing),
            (PublishState::Active, false) => (PublishState::Idle, Emission::Cleared),
            (_, true) => (PublishState::Active, Emission::Content),
        };
        *self = next;
        emission
    }

    pub fn is_active(self) -> bool {
        self == PublishState::Active
    }
}
