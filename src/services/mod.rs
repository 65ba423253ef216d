//! Domain services behind the HTTP handlers.

pub mod catalog_service;
pub mod session_service;
pub mod storage_service;
pub mod upload_service;
