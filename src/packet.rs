mod framing;
mod record;

pub use framing::*;
pub use record::*;
