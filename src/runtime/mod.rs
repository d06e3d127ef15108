pub mod observability;

pub use observability::{Observer, ObserverEvent, create_observer};
