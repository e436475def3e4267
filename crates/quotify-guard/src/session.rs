use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use quotify_core::config::UiConfig;
use quotify_core::content::Theme;

pub const MIN_FONT_SIZE: u16 = 12;
pub const MAX_FONT_SIZE: u16 = 24;

/// Display preferences carried inside the persisted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub theme: Theme,
    pub font_size: u16,
}

impl Settings {
    /// Keep the font size inside the supported range.
    pub fn clamped(mut self) -> Self {
        self.font_size = self.font_size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
        self
    }

    /// Step the font size by `delta` points, staying inside the supported range.
    pub fn with_font_delta(mut self, delta: i32) -> Self {
        let size = (i32::from(self.font_size) + delta)
            .clamp(i32::from(MIN_FONT_SIZE), i32::from(MAX_FONT_SIZE));
        self.font_size = u16::try_from(size).unwrap_or(MIN_FONT_SIZE);
        self
    }
}

impl From<&UiConfig> for Settings {
    fn from(ui: &UiConfig) -> Self {
        Self {
            theme: ui.theme,
            font_size: ui.font_size,
        }
        .clamped()
    }
}

/// The signed-in user as persisted under the record key.
/// The shape is private to the guard; nothing else reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    pub credential_digest: String,
    pub created_at: DateTime<Utc>,
    pub settings: Settings,
}

/// Authoritative authentication state. A user exists only while logged in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Session {
    #[default]
    LoggedOut,
    LoggedIn(UserRecord),
}

impl Session {
    pub fn is_logged_in(&self) -> bool {
        matches!(self, Session::LoggedIn(_))
    }

    pub fn user(&self) -> Option<&UserRecord> {
        match self {
            Session::LoggedIn(user) => Some(user),
            Session::LoggedOut => None,
        }
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            logged_in: self.is_logged_in(),
            username: self.user().map(|u| u.username.clone()),
        }
    }
}

/// Read-only session view handed to UI collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    pub logged_in: bool,
    pub username: Option<String>,
}
