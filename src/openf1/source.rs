use tokio::runtime::Runtime;

use super::client::{OpenF1Client, SupplierConfig};
use crate::data::source::RaceSource;
use crate::error::SupplierError;
use crate::models::RaceRecord;

/// Blocking [`RaceSource`] over the async OpenF1 client
///
/// Owns a current-thread runtime; fetches are strictly sequential.
pub struct OpenF1Source {
    runtime: Runtime,
    client: OpenF1Client,
}

impl OpenF1Source {
    pub fn new(config: SupplierConfig) -> Result<Self, SupplierError> {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
        let client = OpenF1Client::new(config)?;
        Ok(Self { runtime, client })
    }

    pub fn client(&self) -> &OpenF1Client {
        &self.client
    }
}

impl RaceSource for OpenF1Source {
    fn name(&self) -> &str {
        "openf1"
    }

    fn races_for_year(&mut self, year: i32) -> Result<Vec<RaceRecord>, SupplierError> {
        self.runtime.block_on(self.client.fetch_season(year))
    }
}
