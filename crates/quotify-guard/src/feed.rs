use chrono::{DateTime, Utc};

use quotify_core::content::{Friend, Mood, Notification};

/// In-memory friends and notifications derived from a signed-in session.
/// Never persisted; cleared by logout and wipe.
#[derive(Debug, Default)]
pub struct Feed {
    friends: Vec<Friend>,
    notifications: Vec<Notification>,
}

impl Feed {
    /// Populate the plausible starter content shown after sign-in.
    pub fn seed(&mut self) {
        let friend_defs = [
            ("alex", Mood::Green, "2m ago"),
            ("sam", Mood::Yellow, "5m ago"),
            ("taylor", Mood::Red, "1h ago"),
        ];
        self.friends = friend_defs
            .iter()
            .zip(1u64..)
            .map(|((username, mood, last_seen), id)| Friend {
                id,
                username: username.to_string(),
                mood: *mood,
                last_seen: last_seen.to_string(),
            })
            .collect();

        let notification_defs = [
            ("alex", Mood::Green, "Just finished reading an amazing book", "2:30 PM"),
            ("sam", Mood::Yellow, "Need to talk about the project", "1:45 PM"),
        ];
        self.notifications = notification_defs
            .iter()
            .zip(1u64..)
            .map(|((from, mood, message, timestamp), id)| Notification {
                id,
                from: from.to_string(),
                mood: *mood,
                message: message.to_string(),
                timestamp: timestamp.to_string(),
                seen: false,
            })
            .collect();
    }

    pub fn clear(&mut self) {
        self.friends.clear();
        self.notifications.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.friends.is_empty() && self.notifications.is_empty()
    }

    pub fn friends(&self) -> &[Friend] {
        &self.friends
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Append a friend by name. Blank names are refused.
    pub fn add_friend(&mut self, name: &str) -> Option<&Friend> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let id = self.friends.iter().map(|f| f.id).max().unwrap_or(0) + 1;
        self.friends.push(Friend {
            id,
            username: name.to_string(),
            mood: Mood::Red,
            last_seen: "Just added".to_string(),
        });
        self.friends.last()
    }

    /// Returns `false` when no friend has that id.
    pub fn remove_friend(&mut self, id: u64) -> bool {
        let before = self.friends.len();
        self.friends.retain(|f| f.id != id);
        self.friends.len() != before
    }

    pub fn unseen(&self) -> usize {
        self.notifications.iter().filter(|n| !n.seen).count()
    }

    /// Returns `false` when no notification has that id.
    pub fn mark_seen(&mut self, id: u64) -> bool {
        match self.notifications.iter_mut().find(|n| n.id == id) {
            Some(n) => {
                n.seen = true;
                true
            }
            None => false,
        }
    }

    /// Prepend a ping sent by `from`. Empty messages become "No message".
    pub fn push_ping(
        &mut self,
        from: &str,
        mood: Mood,
        message: &str,
        at: DateTime<Utc>,
    ) -> &Notification {
        let id = self.notifications.iter().map(|n| n.id).max().unwrap_or(0) + 1;
        let message = if message.trim().is_empty() {
            "No message".to_string()
        } else {
            message.trim().to_string()
        };
        self.notifications.insert(
            0,
            Notification {
                id,
                from: from.to_string(),
                mood,
                message,
                timestamp: at.format("%H:%M").to_string(),
                seen: false,
            },
        );
        &self.notifications[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_populates_friends_and_notifications() {
        let mut feed = Feed::default();
        assert!(feed.is_empty());
        feed.seed();
        assert_eq!(feed.friends().len(), 3);
        assert_eq!(feed.friends()[0].username, "alex");
        assert_eq!(feed.notifications().len(), 2);
        assert_eq!(feed.unseen(), 2);
    }

    #[test]
    fn mark_seen_targets_one_notification() {
        let mut feed = Feed::default();
        feed.seed();
        assert!(feed.mark_seen(2));
        assert!(!feed.mark_seen(99));
        assert_eq!(feed.unseen(), 1);
        assert!(feed.notifications().iter().any(|n| n.id == 2 && n.seen));
    }

    #[test]
    fn ping_is_prepended_with_fresh_id() {
        let mut feed = Feed::default();
        feed.seed();
        let at = DateTime::parse_from_rfc3339("2026-03-04T09:05:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let ping = feed.push_ping("alice", Mood::Red, "  ", at).clone();
        assert_eq!(ping.id, 3);
        assert_eq!(ping.message, "No message");
        assert_eq!(ping.timestamp, "09:05");
        assert_eq!(feed.notifications()[0], ping);
    }

    #[test]
    fn add_friend_trims_and_appends() {
        let mut feed = Feed::default();
        feed.seed();
        let added = feed.add_friend("  jordan ").cloned().unwrap();
        assert_eq!(added.id, 4);
        assert_eq!(added.username, "jordan");
        assert_eq!(added.last_seen, "Just added");
        assert_eq!(feed.friends().last(), Some(&added));
        assert!(feed.add_friend("   ").is_none());
        assert_eq!(feed.friends().len(), 4);
    }

    #[test]
    fn remove_friend_by_id() {
        let mut feed = Feed::default();
        feed.seed();
        assert!(feed.remove_friend(2));
        assert!(!feed.remove_friend(2));
        let names: Vec<_> = feed.friends().iter().map(|f| f.username.as_str()).collect();
        assert_eq!(names, ["alex", "taylor"]);
        assert_eq!(feed.add_friend("sam").unwrap().id, 4);
    }

    #[test]
    fn clear_empties_everything() {
        let mut feed = Feed::default();
        feed.seed();
        feed.clear();
        assert!(feed.is_empty());
    }
}
