pub mod application_service;
pub mod interview_service;
pub mod lifecycle_service;
pub mod notification_service;
pub mod scheduling_service;
