use std::time::Duration;

use opendlp_db::repositories::EventRepo;
use opendlp_events::{event_types, EventBus, EventPersistence, PlatformEvent};
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn persist_writes_event_row(pool: PgPool) {
    let event = PlatformEvent::new(event_types::ASSEMBLY_CREATED)
        .with_source("assembly", 5)
        .with_payload(serde_json::json!({"name": "Climate Assembly"}));

    let id = EventPersistence::persist(&pool, &event).await.unwrap();
    assert!(id > 0);

    let events = EventRepo::list_for_entity(&pool, "assembly", 5).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, "assembly.created");
    assert_eq!(events[0].payload["name"], "Climate Assembly");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn run_loop_persists_until_bus_dropped(pool: PgPool) {
    let bus = EventBus::default();
    let handle = tokio::spawn(EventPersistence::run(pool.clone(), bus.subscribe()));

    bus.publish(PlatformEvent::new(event_types::REGISTRANT_REGISTERED).with_source("registrant", 1));
    bus.publish(PlatformEvent::new(event_types::REGISTRANT_WITHDRAWN).with_source("registrant", 1));
    drop(bus);

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("persistence loop should stop once the bus is dropped")
        .unwrap();

    let events = EventRepo::list_for_entity(&pool, "registrant", 1).await.unwrap();
    let types: Vec<&str> = events.iter().map(|e| e.event_type.as_str()).collect();
    assert_eq!(types, vec!["registrant.registered", "registrant.withdrawn"]);
}
