pub mod auth_handler;

pub use auth_handler::{
    __path_get_me, __path_login, __path_logout, __path_register, __path_toggle_mode, get_me,
    login, logout, register, toggle_mode,
};
