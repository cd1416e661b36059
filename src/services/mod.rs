pub mod activity_service;
pub mod admin_service;
pub mod deposit_service;
pub mod enrollment_service;
pub mod workshop_service;
