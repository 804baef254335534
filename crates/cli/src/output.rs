//! Terminal rendering. Results go to stdout, notifications and errors to
//! stderr.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use serde::Serialize;
use subify_storefront::AppError;
use subify_storefront::notifications::{Level, Notification};

pub struct Output {
    json: bool,
}

impl Output {
    pub const fn new(json: bool) -> Self {
        Self { json }
    }

    /// Print `value` as JSON, or the text produced by `text`.
    pub fn emit<T, F>(&self, value: &T, text: F)
    where
        T: Serialize,
        F: FnOnce() -> String,
    {
        if self.json {
            match serde_json::to_string_pretty(value) {
                Ok(json) => println!("{json}"),
                Err(e) => eprintln!("error: could not encode output: {e}"),
            }
        } else {
            println!("{}", text());
        }
    }

    pub fn notifications(&self, notifications: &[Notification]) {
        if self.json {
            if !notifications.is_empty()
                && let Ok(json) = serde_json::to_string(notifications)
            {
                eprintln!("{json}");
            }
            return;
        }
        for note in notifications {
            let tag = match note.level {
                Level::Success => "ok",
                Level::Error => "error",
            };
            eprintln!("[{tag}] {note}");
        }
    }

    pub fn failure(&self, error: &AppError) {
        if self.json {
            eprintln!("{}", serde_json::json!({ "error": error.to_string() }));
        } else {
            eprintln!("error: {error}");
        }
    }
}
