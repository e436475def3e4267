use chrono::{DateTime, Utc};

use quotify_core::config::AppConfig;
use quotify_core::content::{Friend, Mood, Notification, Theme};

use crate::clock::Clock;
use crate::digest::{verify_encoded, CredentialDigest};
use crate::error::{GuardError, GuardResult, LoginError};
use crate::feed::Feed;
use crate::lockout::{LockoutTracker, LoginAttemptState};
use crate::session::{Session, SessionView, Settings, UserRecord};
use crate::store::KeyValueStore;

/// Store key of the serialized [`UserRecord`].
pub const USER_KEY: &str = "quotify-user";
/// Store key marking an active sign-in; removed by logout.
pub const AUTH_KEY: &str = "quotify-auth";
/// Store key of the theme preference.
pub const THEME_KEY: &str = "quotify-theme";

/// Gatekeeper for the local session.
///
/// Owns the persisted record, the in-memory [`Session`], login throttling and
/// the derived feed. Every mutation goes through `attempt_login`, `logout`
/// or `wipe`; nothing else writes the store.
pub struct SessionGuard {
    store: Box<dyn KeyValueStore>,
    clock: Box<dyn Clock>,
    session: Session,
    lockout: LockoutTracker,
    feed: Feed,
    min_passphrase_len: usize,
    sentinels: Vec<String>,
    default_settings: Settings,
}

impl SessionGuard {
    /// Build a guard over `store`, restoring a signed-in session if the store holds one.
    pub fn new(store: Box<dyn KeyValueStore>, clock: Box<dyn Clock>, config: &AppConfig) -> Self {
        let mut guard = Self {
            store,
            clock,
            session: Session::LoggedOut,
            lockout: LockoutTracker::new(
                config.auth.lockout_threshold,
                config.auth.max_backoff_secs,
            ),
            feed: Feed::default(),
            min_passphrase_len: config.auth.min_passphrase_len,
            sentinels: config.duress.sentinels.clone(),
            default_settings: Settings::from(&config.ui),
        };
        guard.restore();
        guard
    }

    fn restore(&mut self) {
        let authed = matches!(self.store.get(AUTH_KEY), Ok(Some(ref v)) if v == "true");
        match self.load_record() {
            Ok(Some(record)) if authed => {
                tracing::info!("Restored session for {}", record.username);
                self.session = Session::LoggedIn(record);
                self.feed.seed();
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("Discarding unreadable session record: {e}");
                for key in [USER_KEY, AUTH_KEY] {
                    if let Err(e) = self.store.remove(key) {
                        tracing::warn!("Failed to remove {key}: {e}");
                    }
                }
            }
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // ── Login ────────────────────────────────────────────────────────

    /// Try to open a session.
    ///
    /// Checks run in order: input validation, active lockout, duress
    /// sentinel, then the credential itself. Only the last one can count
    /// towards the lockout.
    pub fn attempt_login(
        &mut self,
        username: &str,
        passphrase: &str,
    ) -> Result<SessionView, LoginError> {
        let username = username.trim();
        let is_sentinel = self.is_sentinel(passphrase);
        if username.is_empty()
            || (!is_sentinel && passphrase.chars().count() < self.min_passphrase_len)
        {
            return Err(LoginError::Validation {
                min_len: self.min_passphrase_len,
            });
        }

        let now = self.clock.now();
        if let Some(remaining_secs) = self.lockout.remaining_secs(now) {
            tracing::debug!("Login refused during lockout ({remaining_secs}s left)");
            return Err(LoginError::LockedOut { remaining_secs });
        }
        self.lockout.expire(now);

        if is_sentinel {
            self.wipe();
            return Err(LoginError::Wiped);
        }

        match self.authenticate(username, passphrase, now) {
            Ok(record) => {
                tracing::info!("Login succeeded for {}", record.username);
                self.session = Session::LoggedIn(record);
                self.lockout.reset();
                self.feed.seed();
                Ok(self.session.view())
            }
            Err(e) => {
                tracing::info!("Login failed: {e}");
                if let Some(until) = self.lockout.record_failure(now) {
                    tracing::warn!(
                        "Locked out after {} failures until {until}",
                        self.lockout.state().failure_count
                    );
                }
                Err(LoginError::Failure)
            }
        }
    }

    fn is_sentinel(&self, passphrase: &str) -> bool {
        self.sentinels.iter().any(|s| s == passphrase)
    }

    fn authenticate(
        &mut self,
        username: &str,
        passphrase: &str,
        now: DateTime<Utc>,
    ) -> GuardResult<UserRecord> {
        let settings = match self.load_record()? {
            Some(existing) => {
                if existing.username != username
                    || !verify_encoded(passphrase, &existing.credential_digest)
                {
                    return Err(GuardError::Rejected);
                }
                existing.settings
            }
            None => self.stored_settings(),
        };

        let record = UserRecord {
            username: username.to_string(),
            credential_digest: CredentialDigest::new(passphrase)?.encode(),
            created_at: now,
            settings,
        };
        self.persist(&record)?;
        self.store.set(AUTH_KEY, "true")?;
        Ok(record)
    }

    fn load_record(&self) -> GuardResult<Option<UserRecord>> {
        match self.store.get(USER_KEY)? {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| GuardError::Serialization(e.to_string())),
            None => Ok(None),
        }
    }

    fn persist(&mut self, record: &UserRecord) -> GuardResult<()> {
        let json =
            serde_json::to_string(record).map_err(|e| GuardError::Serialization(e.to_string()))?;
        self.store.set(USER_KEY, &json)?;
        self.store.set(THEME_KEY, record.settings.theme.as_str())?;
        Ok(())
    }

    // ── Session queries ──────────────────────────────────────────────

    pub fn is_locked_out(&self, now: DateTime<Utc>) -> bool {
        self.lockout.is_locked_out(now)
    }

    /// Whole seconds left on an active lockout, rounded up.
    pub fn lockout_remaining_secs(&self, now: DateTime<Utc>) -> Option<u64> {
        self.lockout.remaining_secs(now)
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_logged_in()
    }

    pub fn current_session(&self) -> SessionView {
        self.session.view()
    }

    pub fn attempt_state(&self) -> LoginAttemptState {
        self.lockout.state()
    }

    /// Fire due lockout-clear timers. Returns how many locks were lifted.
    pub fn tick(&mut self, now: DateTime<Utc>) -> usize {
        let cleared = self.lockout.tick(now);
        if cleared > 0 {
            tracing::debug!("Lockout elapsed");
        }
        cleared
    }

    // ── Logout and wipe ──────────────────────────────────────────────

    /// End the session. The user record and attempt state are kept.
    pub fn logout(&mut self) {
        if let Session::LoggedIn(user) = &self.session {
            tracing::info!("Logged out {}", user.username);
        }
        self.session = Session::LoggedOut;
        self.feed.clear();
        if let Err(e) = self.store.remove(AUTH_KEY) {
            tracing::warn!("Failed to clear sign-in marker: {e}");
        }
    }

    /// Irreversibly destroy every persisted and in-memory trace of the session.
    ///
    /// Never fails: a store error is logged and the in-memory state is
    /// cleared regardless. Safe to call repeatedly.
    pub fn wipe(&mut self) {
        if let Err(e) = self.store.clear() {
            tracing::warn!("Store clear failed during wipe: {e}");
        }
        self.session = Session::LoggedOut;
        self.lockout.invalidate();
        self.feed.clear();
        tracing::debug!("Session state wiped");
    }

    // ── Settings and feed ────────────────────────────────────────────

    fn stored_settings(&self) -> Settings {
        let mut settings = self.default_settings;
        if let Ok(Some(theme)) = self.store.get(THEME_KEY) {
            if let Ok(theme) = theme.parse::<Theme>() {
                settings.theme = theme;
            }
        }
        settings
    }

    pub fn settings(&self) -> Settings {
        match self.session.user() {
            Some(user) => user.settings,
            None => self.stored_settings(),
        }
    }

    /// Save display preferences into the signed-in user's record.
    pub fn update_settings(&mut self, settings: Settings) -> GuardResult<()> {
        let Session::LoggedIn(user) = &self.session else {
            return Err(GuardError::NotLoggedIn);
        };
        let mut record = user.clone();
        record.settings = settings.clamped();
        self.persist(&record)?;
        self.session = Session::LoggedIn(record);
        Ok(())
    }

    /// Step the signed-in user's font size by `delta` and return the new size.
    pub fn adjust_font_size(&mut self, delta: i32) -> GuardResult<u16> {
        let settings = self.settings().with_font_delta(delta);
        self.update_settings(settings)?;
        Ok(settings.font_size)
    }

    pub fn friends(&self) -> &[Friend] {
        self.feed.friends()
    }

    pub fn add_friend(&mut self, name: &str) -> GuardResult<Friend> {
        if !self.session.is_logged_in() {
            return Err(GuardError::NotLoggedIn);
        }
        self.feed
            .add_friend(name)
            .cloned()
            .ok_or(GuardError::EmptyFriendName)
    }

    pub fn remove_friend(&mut self, id: u64) -> GuardResult<bool> {
        if !self.session.is_logged_in() {
            return Err(GuardError::NotLoggedIn);
        }
        Ok(self.feed.remove_friend(id))
    }

    pub fn notifications(&self) -> &[Notification] {
        self.feed.notifications()
    }

    pub fn unseen_count(&self) -> usize {
        self.feed.unseen()
    }

    pub fn mark_seen(&mut self, id: u64) -> bool {
        self.feed.mark_seen(id)
    }

    /// Send a ping from the signed-in user.
    pub fn send_ping(&mut self, mood: Mood, message: &str) -> GuardResult<Notification> {
        let Some(user) = self.session.user() else {
            return Err(GuardError::NotLoggedIn);
        };
        let from = user.username.clone();
        let now = self.clock.now();
        Ok(self.feed.push_ping(&from, mood, message, now).clone())
    }
}
