pub mod hash;
pub mod jwt;
pub mod queries;
pub mod upload;
pub mod urls;
