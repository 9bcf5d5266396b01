//! Notification delivery seam.
//!
//! The session core announces phase boundaries and encouragements through
//! a [`NotificationSink`]; frontends decide how to surface them.

/// Receives user-facing notifications from the timer loop.
pub trait NotificationSink {
    /// Deliver (or schedule, when `delay_secs > 0`) a notification.
    fn schedule(&self, title: &str, body: Option<&str>, delay_secs: u32);
}

/// Prints notifications to stdout.
pub struct ConsoleNotifier;

impl NotificationSink for ConsoleNotifier {
    fn schedule(&self, title: &str, body: Option<&str>, delay_secs: u32) {
        let when = if delay_secs == 0 {
            String::new()
        } else {
            format!(" (in {delay_secs}s)")
        };
        match body {
            Some(body) => println!("🔔 {title}{when}: {body}"),
            None => println!("🔔 {title}{when}"),
        }
    }
}

/// Discards every notification. Used by tests and headless runs.
pub struct NullNotifier;

impl NotificationSink for NullNotifier {
    fn schedule(&self, _title: &str, _body: Option<&str>, _delay_secs: u32) {}
}
