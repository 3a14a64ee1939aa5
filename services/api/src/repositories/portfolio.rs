//! Portfolio repository over the `fdrd`, `stocks` and `hufPf` collections

use async_trait::async_trait;
use common::{
    database::{FDRD, HUF_PF, STOCKS},
    error::{DatabaseError, DatabaseResult},
    models::{FdRdEntry, HufPf, HufPfUpdate, Portfolio, PortfolioKind, StockHolding},
};
use futures_util::TryStreamExt;
use mongodb::{
    Collection, Database,
    bson::{Document, doc, to_document},
};
use tracing::info;
use uuid::Uuid;

use super::PortfolioStore;

#[derive(Clone)]
pub struct MongoPortfolioRepository {
    db: Database,
    fdrd: Collection<FdRdEntry>,
    stocks: Collection<StockHolding>,
    huf_pf: Collection<HufPf>,
}

impl MongoPortfolioRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            db: db.clone(),
            fdrd: db.collection(FDRD),
            stocks: db.collection(STOCKS),
            huf_pf: db.collection(HUF_PF),
        }
    }
}

#[async_trait]
impl PortfolioStore for MongoPortfolioRepository {
    async fn get(&self, user_id: &str) -> DatabaseResult<Portfolio> {
        let filter = doc! { "userId": user_id };

        let fdrd: Vec<FdRdEntry> = self
            .fdrd
            .find(filter.clone())
            .await?
            .try_collect()
            .await?;
        let stocks: Vec<StockHolding> = self
            .stocks
            .find(filter.clone())
            .await?
            .try_collect()
            .await?;
        let huf_pf = self.huf_pf.find_one(filter).await?;

        Ok(Portfolio {
            fdrd,
            stocks,
            huf_pf,
        })
    }

    async fn insert_fdrd(&self, entries: &[FdRdEntry]) -> DatabaseResult<()> {
        let result = self.fdrd.insert_many(entries).await?;
        info!("Inserted {} FD/RD entries", result.inserted_ids.len());
        Ok(())
    }

    async fn insert_stocks(&self, holdings: &[StockHolding]) -> DatabaseResult<()> {
        let result = self.stocks.insert_many(holdings).await?;
        info!("Inserted {} stock holdings", result.inserted_ids.len());
        Ok(())
    }

    async fn upsert_huf_pf(&self, user_id: &str, update: &HufPfUpdate) -> DatabaseResult<HufPf> {
        let fields = to_document(&update.normalized())?;
        let filter = doc! { "userId": user_id };

        self.huf_pf
            .update_one(
                filter.clone(),
                doc! {
                    "$set": fields,
                    "$setOnInsert": { "_id": Uuid::new_v4().to_string() },
                },
            )
            .upsert(true)
            .await?;

        self.huf_pf.find_one(filter).await?.ok_or_else(|| {
            DatabaseError::Conflict("HUF/PF document vanished after upsert".to_string())
        })
    }

    async fn delete(&self, user_id: &str, kind: PortfolioKind, id: &str) -> DatabaseResult<bool> {
        let collection: Collection<Document> = self.db.collection(kind.collection());
        let result = collection
            .delete_one(doc! { "_id": id, "userId": user_id })
            .await?;
        Ok(result.deleted_count == 1)
    }
}
