mod auto_refresh;
mod session_controller;

pub use auto_refresh::spawn_auto_refresh;
pub use session_controller::SessionController;
