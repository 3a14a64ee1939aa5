//! Integration tests for the infrastructure components
//!
//! These tests verify that MongoDB and Redis are reachable with the
//! configuration taken from the environment. They need running servers and
//! are ignored by default: `cargo test -p common -- --ignored`.

use common::{
    cache::{RedisConfig, RedisPool},
    database::{DatabaseConfig, ensure_indexes, health_check, init_database},
    models::{MARKET_RATES_ID, MarketRates},
};
use mongodb::bson::doc;

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn test_mongodb_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = DatabaseConfig::from_env()?;
    config.database = format!("{}_integration", config.database);
    let db = init_database(&config).await?;

    assert!(health_check(&db).await?, "MongoDB health check failed");
    ensure_indexes(&db).await?;

    let rates = db.collection::<MarketRates>("marketRates");
    rates.delete_many(doc! {}).await?;
    rates
        .insert_one(MarketRates::initial(chrono::Utc::now()))
        .await?;

    let stored = rates
        .find_one(doc! { "_id": MARKET_RATES_ID })
        .await?
        .expect("singleton should exist");
    assert_eq!(stored.gold_rate, 6500.0);

    db.drop().await?;
    Ok(())
}

#[tokio::test]
#[ignore = "requires a running Redis"]
async fn test_redis_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let redis_pool = RedisPool::new(&RedisConfig::from_env()?).await?;
    assert!(redis_pool.health_check().await?, "Redis health check failed");

    let key = "integration_test_key";
    redis_pool.set(key, "integration_test_value", Some(10)).await?;
    assert_eq!(
        redis_pool.get(key).await?,
        Some("integration_test_value".to_string())
    );
    assert!(redis_pool.exists(key).await?);

    redis_pool.delete(key).await?;
    assert_eq!(redis_pool.get(key).await?, None);

    Ok(())
}
