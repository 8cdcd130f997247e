mod validator;

pub mod dtos;
pub mod handlers;
pub mod model;
pub mod password;
pub mod policy;
pub mod routes;
pub mod services;

pub use validator::JwtValidator;
