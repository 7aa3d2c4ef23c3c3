pub mod audit;
pub mod token;
pub mod user;
