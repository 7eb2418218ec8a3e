mod client;
mod diff;
mod directory;
mod error;
mod logger;
mod mapper;
mod protocol;
mod session;
mod types;
mod writer;

pub use client::{NgbsClient, NgbsClientBuilder};
pub use directory::DeviceDirectory;
pub use error::{Error, Result};
pub use logger::MessageLogMode;
pub use mapper::{derive_state, valid_humidity};
pub use protocol::{ATTR_MODE_CODE, ATTR_OUTPUT, ATTR_TARGET_TEMP, DEFAULT_BASE_URL};
pub use session::SessionManager;
pub use types::*;
pub use writer::AttributeWriter;
