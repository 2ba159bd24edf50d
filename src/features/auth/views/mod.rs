mod login_view;

pub use login_view::{LoginMode, LoginView, LoginViewDto, REGISTERED_NOTICE};
