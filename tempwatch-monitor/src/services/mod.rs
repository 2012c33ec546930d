mod clock;
mod probe;
mod sink;
mod source;

pub use clock::*;
pub use probe::*;
pub use sink::*;
pub use source::*;
