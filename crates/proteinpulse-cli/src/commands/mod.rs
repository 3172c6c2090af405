mod account;
mod foods;
mod goal;
mod helpers;
mod log;
mod profile;

pub(crate) use account::{cmd_signin, cmd_signout, cmd_signup, cmd_status, cmd_sync};
pub(crate) use foods::{cmd_foods_add, cmd_foods_list, cmd_foods_rm};
pub(crate) use goal::{cmd_goal_set, cmd_goal_show};
pub(crate) use log::{cmd_log_add, cmd_log_rm, cmd_log_show};
pub(crate) use profile::{cmd_profile_reset, cmd_profile_set, cmd_profile_show};
