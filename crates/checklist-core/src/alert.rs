use std::io::{self, Write};

use tracing::warn;

/// Surfaces blocking, user-visible messages.
pub trait Notifier {
    fn alert(&mut self, message: &str);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn alert(&mut self, message: &str) {
        let mut err = io::stderr().lock();
        if let Err(write_err) = writeln!(err, "! {message}") {
            warn!(error = %write_err, message, "failed writing alert to stderr");
        }
    }
}

/// Keeps every alert in order so callers can inspect what the user was told.
#[derive(Debug, Default, Clone)]
pub struct RecordingNotifier {
    pub messages: Vec<String>,
}

impl Notifier for RecordingNotifier {
    fn alert(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }
}

pub const LOAD_FAILED: &str = "Could not load tasks. Check your connection.";
pub const CREATE_FAILED: &str = "Could not add the task. Try again.";
pub const DELETE_FAILED: &str = "Could not delete the task. Try again.";
pub const UPDATE_FAILED: &str = "Could not update the task. Try again.";
pub const EXPORT_FAILED: &str = "Could not export the tasks.";
pub const EMPTY_INPUT: &str = "Please write a task before adding it.";
