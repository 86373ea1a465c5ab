// Services module - password hashing and default data seeding

pub mod password_service;
pub mod seed_service;
