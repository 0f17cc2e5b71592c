mod descriptor;
mod invoker;
mod sink;

pub use descriptor::{DownloadTarget, Method, RequestDescriptor, RequestOptions};
pub use invoker::{Transport, UPLOAD_FIELD};
pub use sink::{ResponseBody, ResponseOutcome, ResponseSink, filename_from_disposition};
