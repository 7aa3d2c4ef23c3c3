pub mod account_service;
pub mod device_service;
pub mod password_service;
pub mod token_service;
