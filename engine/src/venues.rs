/// Venue client handles passed to the executor. In sandbox mode (the
/// only mode implemented) orders are acknowledged locally and never
/// leave the process.
use crate::config::EngineConfig;
use crate::quotes::QUOTE_VENUES;
use executor::{OrderSide, VenueClient};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

pub struct SimulatedVenueClient {
    venue: String,
}

impl SimulatedVenueClient {
    pub fn new(venue: &str) -> Self {
        Self { venue: venue.to_string() }
    }
}

#[async_trait::async_trait]
impl VenueClient for SimulatedVenueClient {
    fn name(&self) -> &str {
        &self.venue
    }

    async fn place_order(
        &self,
        symbol: &str,
        side: OrderSide,
        price: f64,
        amount: f64,
    ) -> anyhow::Result<()> {
        debug!(
            "[sandbox:{}] {:?} {} {} @ {}",
            self.venue, side, amount, symbol, price
        );
        Ok(())
    }
}

pub fn build_venue_clients(_config: &EngineConfig) -> HashMap<String, Arc<dyn VenueClient>> {
    QUOTE_VENUES
        .iter()
        .map(|venue| {
            (
                venue.to_string(),
                Arc::new(SimulatedVenueClient::new(venue)) as Arc<dyn VenueClient>,
            )
        })
        .collect()
}
