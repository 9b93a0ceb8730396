mod dispatch;
mod email;
mod prayer;
mod reminder;

pub use dispatch::*;
pub use email::*;
pub use prayer::*;
pub use reminder::*;
