mod client;
mod errors;
mod query;
mod table;
pub use self::client::{Client, DEFAULT_PAGE_SIZE};
pub use self::errors::Error;
pub use self::query::{ParamValue, QueryParams};
pub use self::table::{DataTable, DataValue, ResponseFormat};
