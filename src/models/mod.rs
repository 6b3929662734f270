mod session;
mod webhook_delivery;

pub use session::*;
pub use webhook_delivery::*;
