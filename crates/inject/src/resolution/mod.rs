pub mod arguments;
pub mod resolved;
pub mod resolver;

pub use arguments::Arguments;
pub use resolved::{downcast_instance, Resolved};
pub use resolver::resolve;
