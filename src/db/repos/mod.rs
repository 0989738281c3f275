mod action_logs;
mod app_configuration;
mod conversations;
mod support_data;
mod users;

pub use action_logs::*;
pub use app_configuration::*;
pub use conversations::*;
pub use support_data::*;
pub use users::*;
