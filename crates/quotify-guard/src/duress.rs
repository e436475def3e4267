use std::fmt;
use std::str::FromStr;

use zeroize::{Zeroize, ZeroizeOnDrop};

use quotify_core::config::DuressConfig;
use quotify_core::interfaces::Navigator;

use crate::error::{GuardError, GuardResult};
use crate::guard::SessionGuard;

// ── Key events ───────────────────────────────────────────────────────

/// A key press as delivered by the host, with its modifier state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
    pub key: String,
    default_prevented: bool,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            ctrl: false,
            alt: false,
            shift: false,
            meta: false,
            key: key.into(),
            default_prevented: false,
        }
    }

    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn meta(mut self) -> Self {
        self.meta = true;
        self
    }

    /// Stop the host from applying its own binding for this key.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Modifiers that can take part in a chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    Ctrl,
    Alt,
    Shift,
    Meta,
}

impl Modifier {
    fn held(self, event: &KeyEvent) -> bool {
        match self {
            Modifier::Ctrl => event.ctrl,
            Modifier::Alt => event.alt,
            Modifier::Shift => event.shift,
            Modifier::Meta => event.meta,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Modifier::Ctrl => "ctrl",
            Modifier::Alt => "alt",
            Modifier::Shift => "shift",
            Modifier::Meta => "meta",
        }
    }
}

/// Two held modifiers plus one key, e.g. `ctrl+alt+q`.
///
/// The key matches case-insensitively and modifiers outside the chord are
/// ignored, so `ctrl+alt+shift+Q` still fires `ctrl+alt+q`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyChord {
    modifiers: [Modifier; 2],
    key: String,
}

impl KeyChord {
    pub fn matches(&self, event: &KeyEvent) -> bool {
        self.modifiers.iter().all(|m| m.held(event)) && event.key.to_lowercase() == self.key
    }
}

impl FromStr for KeyChord {
    type Err = GuardError;

    fn from_str(s: &str) -> GuardResult<Self> {
        let parts: Vec<String> = s
            .split('+')
            .map(|p| p.trim().to_lowercase())
            .collect();
        let [first, second, key] = parts.as_slice() else {
            return Err(GuardError::InvalidChord(format!(
                "expected modifier+modifier+key, got {s:?}"
            )));
        };

        let parse_modifier = |name: &str| match name {
            "ctrl" | "control" => Ok(Modifier::Ctrl),
            "alt" | "option" => Ok(Modifier::Alt),
            "shift" => Ok(Modifier::Shift),
            "meta" | "cmd" | "super" => Ok(Modifier::Meta),
            other => Err(GuardError::InvalidChord(format!("unknown modifier {other:?}"))),
        };
        let a = parse_modifier(first.as_str())?;
        let b = parse_modifier(second.as_str())?;
        if a == b {
            return Err(GuardError::InvalidChord(format!("modifier repeated in {s:?}")));
        }
        if key.is_empty() {
            return Err(GuardError::InvalidChord(format!("missing key in {s:?}")));
        }

        Ok(Self {
            modifiers: [a, b],
            key: key.clone(),
        })
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}+{}+{}",
            self.modifiers[0].name(),
            self.modifiers[1].name(),
            self.key
        )
    }
}

// ── Canary detector ──────────────────────────────────────────────────

/// Watches typed text for a secret panic phrase.
/// Keeps a rolling buffer and checks for a match after each character.
pub struct CanaryDetector {
    phrase: CanaryPhrase,
    /// Last `phrase.len() * 2` bytes of input at most.
    buffer: String,
}

#[derive(Zeroize, ZeroizeOnDrop)]
struct CanaryPhrase {
    text: String,
}

impl CanaryDetector {
    pub fn new(phrase: String) -> Self {
        Self {
            buffer: String::with_capacity(phrase.len() * 2),
            phrase: CanaryPhrase { text: phrase },
        }
    }

    /// Feed one character. Returns `true` when the phrase has just been completed.
    pub fn feed_char(&mut self, ch: char) -> bool {
        if self.phrase.text.is_empty() {
            return false;
        }
        self.buffer.push(ch);
        self.trim_buffer();
        if self.buffer.ends_with(&self.phrase.text) {
            self.buffer.zeroize();
            return true;
        }
        false
    }

    /// Feed a run of text (e.g. a paste). Returns `true` if the phrase appears.
    pub fn feed_str(&mut self, text: &str) -> bool {
        text.chars().any(|ch| self.feed_char(ch))
    }

    fn trim_buffer(&mut self) {
        let max_len = self.phrase.text.len() * 2;
        if self.buffer.len() > max_len {
            let drain_to = self.buffer.len() - max_len;
            let boundary = self
                .buffer
                .char_indices()
                .map(|(i, _)| i)
                .find(|&i| i >= drain_to)
                .unwrap_or(self.buffer.len());
            self.buffer.drain(..boundary);
        }
    }
}

impl Drop for CanaryDetector {
    fn drop(&mut self) {
        self.buffer.zeroize();
    }
}

// ── Trigger ──────────────────────────────────────────────────────────

/// Global panic listener.
///
/// Sees every key event regardless of focus. The chord (or the typed canary
/// phrase) wipes the guard and sends the user to the entry surface with no
/// confirmation. Repeats are harmless since the wipe is idempotent.
pub struct DuressTrigger {
    chord: KeyChord,
    canary: Option<CanaryDetector>,
    navigator: Box<dyn Navigator>,
    fired: u64,
}

impl DuressTrigger {
    pub fn new(chord: KeyChord, navigator: Box<dyn Navigator>) -> Self {
        Self {
            chord,
            canary: None,
            navigator,
            fired: 0,
        }
    }

    /// Build from the `[duress]` config section.
    pub fn from_config(config: &DuressConfig, navigator: Box<dyn Navigator>) -> GuardResult<Self> {
        let chord: KeyChord = config.chord.parse()?;
        let mut trigger = Self::new(chord, navigator);
        if let Some(phrase) = config.canary_phrase.as_ref().filter(|p| !p.is_empty()) {
            trigger = trigger.with_canary(phrase.clone());
        }
        Ok(trigger)
    }

    pub fn with_canary(mut self, phrase: String) -> Self {
        self.canary = Some(CanaryDetector::new(phrase));
        self
    }

    pub fn chord(&self) -> &KeyChord {
        &self.chord
    }

    /// Number of wipes this trigger has performed.
    pub fn fired(&self) -> u64 {
        self.fired
    }

    /// Handle one key event. Returns `true` if it was the panic chord.
    pub fn handle_key(&mut self, guard: &mut SessionGuard, event: &mut KeyEvent) -> bool {
        if !self.chord.matches(event) {
            return false;
        }
        event.prevent_default();
        self.fire(guard);
        true
    }

    /// Feed typed text to the canary detector. Returns `true` if it fired.
    pub fn handle_text(&mut self, guard: &mut SessionGuard, text: &str) -> bool {
        let Some(canary) = self.canary.as_mut() else {
            return false;
        };
        if !canary.feed_str(text) {
            return false;
        }
        self.fire(guard);
        true
    }

    /// Drain a stream of key events, returning how many wipes fired.
    pub fn listen<I>(&mut self, guard: &mut SessionGuard, events: I) -> usize
    where
        I: IntoIterator<Item = KeyEvent>,
    {
        let mut wiped = 0;
        for mut event in events {
            if self.handle_key(guard, &mut event) {
                wiped += 1;
            }
        }
        wiped
    }

    fn fire(&mut self, guard: &mut SessionGuard) {
        guard.wipe();
        self.fired += 1;
        self.navigator.navigate_to_entry();
    }
}
