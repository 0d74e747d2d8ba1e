mod console;

pub use console::{describe, describe_layers};
