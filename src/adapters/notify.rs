//! User-notification event sink.
//!
//! Turns the handful of engine events a user should hear about into
//! `notify(title, body)` calls on a [`Notifier`].  Everything else is
//! ignored.  Delivery is fire-and-forget.

use log::info;

use crate::app::events::PetEvent;
use crate::app::ports::{EventSink, Notifier};

pub struct NotificationEventSink<N> {
    notifier: N,
}

impl<N: Notifier> NotificationEventSink<N> {
    pub fn new(notifier: N) -> Self {
        Self { notifier }
    }

    pub fn into_inner(self) -> N {
        self.notifier
    }
}

impl<N: Notifier> EventSink for NotificationEventSink<N> {
    fn emit(&mut self, event: &PetEvent) {
        match event {
            PetEvent::HungerAlert { .. } => {
                self.notifier
                    .notify("Your pet is hungry!", "Go for a walk and feed your pet.");
            }
            PetEvent::DailyGoalReached { steps } => {
                let body = format!("You reached {} steps today. Your pet is proud!", steps);
                self.notifier.notify("Daily goal reached!", &body);
            }
            PetEvent::DailySummary { steps, .. } => {
                let body = format!("You walked {} steps today.", steps);
                self.notifier.notify("Daily step summary", &body);
            }
            PetEvent::Departed => {
                self.notifier
                    .notify("Your pet has left", "Reset to adopt a new pet.");
            }
            _ => {}
        }
    }
}

/// Notifier that writes to the log (host builds without a notification tray).
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, title: &str, body: &str) {
        info!("NOTIFY | {} | {}", title, body);
    }
}
