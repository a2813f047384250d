pub mod command;
pub mod event;

pub use command::{
    join_list, split_list, Command, DisableKey, Response, SettingChange, SettingsInfo,
    SettingsView, StatusInfo,
};
pub use event::{EventFilter, ServiceEvent, SubscribeRequest};
