pub mod clock;
pub mod digest;
pub mod duress;
pub mod error;
pub mod feed;
pub mod guard;
pub mod lockout;
pub mod session;
pub mod store;

pub use duress::{DuressTrigger, KeyChord, KeyEvent};
pub use error::{GuardError, GuardResult, LoginError, StoreError, StoreResult};
pub use guard::SessionGuard;
pub use session::{Session, SessionView, Settings, UserRecord};
