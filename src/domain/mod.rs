pub mod session;
pub mod token;
pub mod vehicle;
