pub mod account;
pub mod clock;
pub mod error;
pub mod policy;

pub use account::{Account, AccountInfo};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::AuthError;
pub use policy::{PolicyStore, PolicyValue};
