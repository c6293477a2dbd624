pub mod args;
pub mod op;
pub mod ops;

pub use ops::{Address, Demo, Init, Inspect, Keygen, Open, Seal, Version};
