pub mod earnings;
pub mod user;

pub use earnings::{EarningEntry, MarketSession};
pub use user::UserRecord;
