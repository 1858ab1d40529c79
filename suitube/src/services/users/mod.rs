pub mod users_service;

pub use users_service::UsersService;
