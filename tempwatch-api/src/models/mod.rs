mod alert;
mod event;
mod reading;
mod threshold;

pub use alert::*;
pub use event::*;
pub use reading::*;
pub use threshold::*;
