pub mod channel;
pub mod content;
pub mod lineworks;
pub mod motion_messages;
pub mod postback;

pub use channel::ChatChannel;
pub use content::Content;
pub use lineworks::{ChatTransport, LineWorksBot};
pub use motion_messages::MotionMessages;
pub use postback::{build_postback, parse_postback, Postback};
