pub mod process;
pub mod session;

pub use process::{ProcessRequest, ProcessResponse, RequestError};
pub use session::{ChatSession, Role, Turn};
