//! User-notification marker convention.
//!
//! A command error whose message starts with [`NOTIFY_MARKER`] is a transient
//! message for the user (status line, echo area), not a systemic failure. The
//! host strips the marker before display and must not log such errors as
//! faults.

/// Marker prefix distinguishing user notifications from genuine errors.
pub const NOTIFY_MARKER: &str = "PLUGIN_MESSAGE:";

/// Wraps `text` in the notification marker.
#[must_use]
pub fn notification(text: impl AsRef<str>) -> String {
    format!("{NOTIFY_MARKER}{}", text.as_ref())
}

/// Strips the notification marker, returning the user-facing text.
///
/// Returns `None` when the message is not a notification and should be
/// treated as a real error.
#[must_use]
pub fn strip_notification(message: &str) -> Option<&str> {
    message.strip_prefix(NOTIFY_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_round_trips() {
        let wire = notification("Buffer diff completed: 3 differences found");
        assert_eq!(
            strip_notification(&wire),
            Some("Buffer diff completed: 3 differences found")
        );
    }

    #[test]
    fn plain_errors_are_not_notifications() {
        assert_eq!(strip_notification("connection reset"), None);
    }
}
