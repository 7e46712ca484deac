mod countdown;
mod ticker;

pub use countdown::{CountdownEngine, CountdownSnapshot, CountdownState, CountdownTransition};
pub use ticker::{SharedEngine, Ticker};
