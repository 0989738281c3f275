mod action_log;
mod app_configuration;
mod conversation;
mod support_entity;
mod user;

pub use action_log::*;
pub use app_configuration::*;
pub use conversation::*;
pub use support_entity::*;
pub use user::*;
