//! User accounts, sessions and the pages for registering, logging in and
//! logging out.

mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod password;
mod redirect;
mod register_user;
mod token;
mod user;

pub use cookie::{DEFAULT_COOKIE_DURATION, invalidate_auth_cookie, set_auth_cookie};
pub use log_in::{get_log_in_page, post_log_in};
pub use log_out::get_log_out;
pub use middleware::{auth_guard, auth_guard_hx};
pub use password::{PasswordHash, ValidatedPassword};
pub use register_user::{get_register_page, register_user};
pub use user::{
    User, UserID, Username, count_users, create_user, create_user_table, get_user_by_id,
    get_user_by_username, update_password,
};

pub(crate) use cookie::get_token_from_cookies;
pub(crate) use token::Token;

#[cfg(test)]
pub use cookie::COOKIE_TOKEN;

#[cfg(test)]
pub use middleware::AuthState;
