use std::future::Future;

use openwb_api::{OpenWbClient, RawSnapshot};

/// Anything that can produce one status snapshot per call.
///
/// Implemented by [`OpenWbClient`]; the seam exists so the poll cycle can
/// be driven by other transports or by scripted sources in tests.
pub trait StatusSource: Send + Sync + 'static {
    /// Fetch one snapshot. Must not retry internally.
    fn fetch(&self) -> impl Future<Output = Result<RawSnapshot, openwb_api::Error>> + Send;

    /// Address shown in logs and errors.
    fn describe(&self) -> String;
}

impl StatusSource for OpenWbClient {
    fn fetch(&self) -> impl Future<Output = Result<RawSnapshot, openwb_api::Error>> + Send {
        self.fetch_status()
    }

    fn describe(&self) -> String {
        self.url().to_string()
    }
}
