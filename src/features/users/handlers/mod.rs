pub mod user_handler;

pub use user_handler::{
    __path_get_me, __path_list_users, __path_set_ban, __path_set_role, get_me, list_users,
    set_ban, set_role,
};
