//! Transient player-facing messages (the toast box above the grid).

/// A message the UI shows for a short while.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Notice {
    NoChancesRemaining,
    WrongClick,
    Timeout,
    GameComplete,
    ShareRewarded,
    ShareUnavailable,
    ShareAlreadyUsed,
    ShareFailed,
    ScoreSaved,
    SavedLocallyOnly,
    RankingOffline,
    InvalidName,
    Internal,
}

impl Notice {
    pub fn text(self) -> &'static str {
        match self {
            Notice::NoChancesRemaining => "No chances left! Share the game with a friend to earn one.",
            Notice::WrongClick => "Wrong number! Keep going.",
            Notice::Timeout => "Time's up! The game will restart.",
            Notice::GameComplete => "All five rounds cleared. Congratulations!",
            Notice::ShareRewarded => "Shared! You earned one more chance.",
            Notice::ShareUnavailable => "Sharing is not available right now. Please try again.",
            Notice::ShareAlreadyUsed => "The share reward can only be claimed once.",
            Notice::ShareFailed => "Sharing failed.",
            Notice::ScoreSaved => "Your time was added to the ranking.",
            Notice::SavedLocallyOnly => "Saved on this device only; the global ranking is unreachable.",
            Notice::RankingOffline => "Showing cached rankings; the global ranking is unreachable.",
            Notice::InvalidName => "Please enter a name.",
            Notice::Internal => "Something went wrong.",
        }
    }

    /// Notices that end or block a game stay up longer.
    pub fn is_long(self) -> bool {
        matches!(self, Notice::NoChancesRemaining | Notice::Timeout | Notice::GameComplete)
    }
}

/// Sink for notices. The browser shows them in the message box; tests record them.
pub trait Notifier {
    fn notify(&mut self, notice: Notice);
}

/// Keeps every notice in order. Useful headless and in tests.
#[derive(Debug, Default)]
pub struct NoticeLog {
    pub notices: Vec<Notice>,
}

impl Notifier for NoticeLog {
    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}

impl NoticeLog {
    pub fn last(&self) -> Option<Notice> {
        self.notices.last().copied()
    }
}
