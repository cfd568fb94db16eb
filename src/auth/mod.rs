pub mod client;

pub use client::{AuthClient, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
