pub mod listing;
pub mod moderation;
pub mod review;
pub mod user;
