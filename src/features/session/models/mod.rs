mod role;
mod state;

pub use role::Role;
pub use state::SessionState;
