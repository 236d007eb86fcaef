// Transmission: encoding, batching and delivery of assembled reports.

pub mod batch;
pub mod sender;
pub mod transport;

pub use batch::BatchBuffer;
pub use sender::{ReportSender, encode_json_batch, query_url};
pub use transport::{HttpTransport, ReportRequest, ReportTransport, create_client};
