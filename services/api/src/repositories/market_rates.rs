//! Market rates repository

use async_trait::async_trait;
use common::{
    database::MARKET_RATES,
    error::{DatabaseError, DatabaseResult, is_duplicate_key},
    models::{MARKET_RATES_ID, MarketRates},
};
use mongodb::{Collection, Database, bson::doc};
use tracing::info;

use super::MarketRatesStore;

/// Singleton document in `marketRates`, keyed by a fixed id
#[derive(Clone)]
pub struct MongoMarketRatesRepository {
    collection: Collection<MarketRates>,
}

impl MongoMarketRatesRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(MARKET_RATES),
        }
    }
}

#[async_trait]
impl MarketRatesStore for MongoMarketRatesRepository {
    async fn get(&self) -> DatabaseResult<Option<MarketRates>> {
        let rates = self
            .collection
            .find_one(doc! { "_id": MARKET_RATES_ID })
            .await?;
        Ok(rates)
    }

    async fn save(&self, next: &MarketRates) -> DatabaseResult<()> {
        if next.version == 1 {
            return match self.collection.insert_one(next).await {
                Ok(_) => {
                    info!("Created market rates");
                    Ok(())
                }
                Err(e) if is_duplicate_key(&e) => Err(DatabaseError::Conflict(
                    "market rates were created concurrently".to_string(),
                )),
                Err(e) => Err(e.into()),
            };
        }

        let result = self
            .collection
            .replace_one(
                doc! { "_id": MARKET_RATES_ID, "version": next.version - 1 },
                next,
            )
            .await?;

        if result.matched_count == 0 {
            return Err(DatabaseError::Conflict(
                "market rates were updated concurrently".to_string(),
            ));
        }

        info!("Market rates updated to version {}", next.version);
        Ok(())
    }
}
