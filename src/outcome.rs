//! Composable operation outcomes.
//!
//! Every step of a reload pass reports an [`Outcome`] instead of raising, so a
//! batch over hundreds of references can finish with some items failing. The
//! batch outcome is the fold of every item outcome with [`Outcome::merge`].

/// Separator placed between messages when outcomes are merged.
pub const MESSAGE_SEPARATOR: &str = "\n";

/// Status flag, append-only message log, and optional payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome<T> {
    /// Human-readable log. Messages are appended, never overwritten.
    pub message: String,
    /// `true` when everything that contributed succeeded.
    pub status: bool,
    /// Optional payload such as the ids of newly introduced types.
    pub value: Option<T>,
}

impl<T> Default for Outcome<T> {
    fn default() -> Self {
        return Self {
            message: String::new(),
            status: true,
            value: None,
        };
    }
}

impl<T> Outcome<T> {
    /// A failed outcome with the given message.
    pub fn failed(message: impl Into<String>) -> Self {
        return Self {
            message: message.into(),
            status: false,
            value: None,
        };
    }

    /// A successful outcome with the given message.
    pub fn ok(message: impl Into<String>) -> Self {
        return Self {
            message: message.into(),
            status: true,
            value: None,
        };
    }

    /// Append a message without touching the status.
    #[must_use]
    pub fn append_message(self, message: &str) -> Self {
        return Self {
            message: join_messages(self.message, message),
            status: self.status,
            value: self.value,
        };
    }

    /// Drop the payload, keeping status and message.
    pub fn discard_value<U>(self) -> Outcome<U> {
        return Outcome {
            message: self.message,
            status: self.status,
            value: None,
        };
    }

    /// Combine two outcomes: statuses are AND-ed, messages joined in order,
    /// and the later payload wins when both carry one.
    ///
    /// An empty message is the identity for the join, which keeps merging
    /// associative and free of stray separators.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        return Self {
            message: join_messages(self.message, &other.message),
            status: self.status && other.status,
            value: other.value.or(self.value),
        };
    }

    /// Fold any number of outcomes, left to right, starting from the default.
    pub fn merge_all(outcomes: impl IntoIterator<Item = Self>) -> Self {
        return outcomes.into_iter().fold(Self::default(), Self::merge);
    }

    /// AND the status and append the message.
    #[must_use]
    pub fn update_sep(self, status: bool, message: &str) -> Self {
        return Self {
            message: join_messages(self.message, message),
            status: self.status && status,
            value: self.value,
        };
    }

    /// Attach a payload.
    #[must_use]
    pub fn with_value(self, value: T) -> Self {
        return Self {
            message: self.message,
            status: self.status,
            value: Some(value),
        };
    }
}

/// Join two messages with [`MESSAGE_SEPARATOR`], treating empty as identity.
fn join_messages(mut head: String, tail: &str) -> String {
    if tail.is_empty() {
        return head;
    }
    if !head.is_empty() {
        head.push_str(MESSAGE_SEPARATOR);
    }
    head.push_str(tail);
    return head;
}
