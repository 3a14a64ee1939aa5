//! Admin request repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{
    database::ADMIN_REQUESTS,
    error::{DatabaseError, DatabaseResult},
    models::{AdminRequest, RequestStatus},
};
use futures_util::TryStreamExt;
use mongodb::{
    Collection, Database,
    bson::{self, Document, doc},
};
use serde::{Deserialize, Serialize};

use super::AdminRequestStore;

/// Stored shape of an [`AdminRequest`]
///
/// Timestamps are BSON dates so `createdAt` sorts chronologically.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdminRequestRecord {
    #[serde(rename = "_id")]
    id: String,
    user_id: String,
    user_name: String,
    message: String,
    status: RequestStatus,
    created_at: bson::DateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    resolved_at: Option<bson::DateTime>,
}

fn to_bson_date(at: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(at.timestamp_millis())
}

fn from_bson_date(at: bson::DateTime) -> DatabaseResult<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(at.timestamp_millis())
        .ok_or_else(|| DatabaseError::Encoding(format!("timestamp out of range: {}", at)))
}

impl From<&AdminRequest> for AdminRequestRecord {
    fn from(request: &AdminRequest) -> Self {
        Self {
            id: request.id.clone(),
            user_id: request.user_id.clone(),
            user_name: request.user_name.clone(),
            message: request.message.clone(),
            status: request.status,
            created_at: to_bson_date(request.created_at),
            resolved_at: request.resolved_at.map(to_bson_date),
        }
    }
}

impl TryFrom<AdminRequestRecord> for AdminRequest {
    type Error = DatabaseError;

    fn try_from(record: AdminRequestRecord) -> DatabaseResult<Self> {
        Ok(Self {
            id: record.id,
            user_id: record.user_id,
            user_name: record.user_name,
            message: record.message,
            status: record.status,
            created_at: from_bson_date(record.created_at)?,
            resolved_at: record.resolved_at.map(from_bson_date).transpose()?,
        })
    }
}

#[derive(Clone)]
pub struct MongoAdminRequestRepository {
    collection: Collection<AdminRequestRecord>,
}

impl MongoAdminRequestRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(ADMIN_REQUESTS),
        }
    }

    async fn find(&self, filter: Document) -> DatabaseResult<Vec<AdminRequest>> {
        let records: Vec<AdminRequestRecord> = self
            .collection
            .find(filter)
            .sort(doc! { "createdAt": -1, "_id": -1 })
            .await?
            .try_collect()
            .await?;

        records.into_iter().map(AdminRequest::try_from).collect()
    }
}

#[async_trait]
impl AdminRequestStore for MongoAdminRequestRepository {
    async fn create(&self, request: &AdminRequest) -> DatabaseResult<()> {
        self.collection
            .insert_one(AdminRequestRecord::from(request))
            .await?;
        Ok(())
    }

    async fn list_all(&self) -> DatabaseResult<Vec<AdminRequest>> {
        self.find(doc! {}).await
    }

    async fn list_for_user(&self, user_id: &str) -> DatabaseResult<Vec<AdminRequest>> {
        self.find(doc! { "userId": user_id }).await
    }

    async fn resolve(&self, id: &str) -> DatabaseResult<bool> {
        // The status filter makes pending -> resolved a single atomic step
        let result = self
            .collection
            .update_one(
                doc! { "_id": id, "status": RequestStatus::Pending.as_str() },
                doc! {
                    "$set": {
                        "status": RequestStatus::Resolved.as_str(),
                        "resolvedAt": to_bson_date(Utc::now()),
                    }
                },
            )
            .await?;

        Ok(result.matched_count == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mongodb::bson::{Bson, from_document, to_document};

    #[test]
    fn test_timestamps_are_stored_as_bson_dates() {
        let mut request = AdminRequest::new("user-1", "Ganesh Kumar", "Need help");
        request.created_at = Utc.with_ymd_and_hms(2025, 3, 1, 10, 30, 0).unwrap();
        request.resolved_at = Some(Utc.with_ymd_and_hms(2025, 3, 2, 9, 0, 0).unwrap());

        let document = to_document(&AdminRequestRecord::from(&request)).unwrap();
        assert!(matches!(document.get("createdAt"), Some(Bson::DateTime(_))));
        assert!(matches!(document.get("resolvedAt"), Some(Bson::DateTime(_))));
        assert_eq!(document.get_str("status").unwrap(), "pending");

        let record: AdminRequestRecord = from_document(document).unwrap();
        assert_eq!(AdminRequest::try_from(record).unwrap(), request);
    }

    #[test]
    fn test_sub_second_order_survives_storage() {
        let earlier = Utc.timestamp_millis_opt(1_740_825_000_100).unwrap();
        let later = Utc.timestamp_millis_opt(1_740_825_000_900).unwrap();

        assert!(to_bson_date(earlier) < to_bson_date(later));
    }
}
