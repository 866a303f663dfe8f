//! IMAP command handlers for the fake server.
//!
//! Each handler lives in its own module and processes a single IMAP
//! command (APPEND, CAPABILITY, CREATE, FETCH, LIST, LOGIN, LOGOUT,
//! SEARCH, SELECT/EXAMINE, STORE).

mod capability;
mod list;
mod logout;
mod select;

pub use append::handle_append;
pub use capability::handle_capability;
pub use create::handle_create;
pub use fetch::handle_fetch;
pub use list::handle_list;
pub use login::{PASSWORD, USERNAME, handle_login};
pub use logout::handle_logout;
pub use search::handle_search;
pub use select::handle_select;
pub use store::handle_store;
