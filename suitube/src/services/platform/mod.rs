pub mod platform_service;

pub use platform_service::PlatformService;
