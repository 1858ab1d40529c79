pub mod registry;

pub use registry::VideoRegistry;
