mod action_logs;
mod app_configuration;
mod common;
mod conversations;
mod support_data;
mod users;

pub use action_logs::SqliteActionLogRepo;
pub use app_configuration::SqliteAppConfigurationRepo;
pub use conversations::SqliteConversationRepo;
pub use support_data::SqliteSupportDataRepo;
pub use users::SqliteUserRepo;
