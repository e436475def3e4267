//! Contracts between the session guard and the presentation layer.
//!
//! The guard never renders anything itself; it only calls back through
//! these traits.

use crate::content::Friend;

/// Moves the user to the unauthenticated entry surface.
/// Called after a wipe or an explicit logout.
pub trait Navigator {
    fn navigate_to_entry(&self);
}

/// Decorative rendering the core asks of the UI.
pub trait Surface {
    fn show_quote(&self, quote: &str);
    fn show_friends(&self, friends: &[Friend]);
}
