mod dispatch;
mod message;

pub use dispatch::{DispatchOutcome, MessageDispatch, APOLOGY_TEXT};
pub use message::{Message, MessageLog, Sender};
