mod config;
mod connection;
pub mod cursor;
mod document;
pub mod layout;
mod message;
mod persistence;
mod presence;
mod router;
mod session;
mod session_state;
mod traits;
mod types;

pub use config::*;
pub use connection::*;
pub use cursor::*;
pub use document::*;
pub use layout::*;
pub use message::*;
pub use persistence::*;
pub use presence::*;
pub use router::*;
pub use session::*;
pub use session_state::*;
pub use traits::*;
pub use types::*;

pub extern crate euclid;
pub extern crate serde;
pub extern crate serde_json;
