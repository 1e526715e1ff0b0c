//! Tests against a running MongoDB server.
//!
//! Ignored by default. Run with `cargo test -p sizable-mongodb -- --ignored`, pointing
//! `SIZABLE_MONGODB_URI` at a server (defaults to `mongodb://localhost:27017`).

use bson::oid::ObjectId;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, time::Duration};

use sizable_core::{
    accessor::Accessor,
    driver::DriverBuilder,
    entity::Entity,
    error::AccessorError,
    filter::{Filter, Sort},
    page::PageWindow,
    store::Store,
};
use sizable_mongodb::MongoDbDriver;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Thing {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    number: i32,
    user: String,
}

impl Entity for Thing {
    fn collection_name() -> &'static str {
        "things"
    }
}

fn nine_things() -> Vec<Thing> {
    (1..=9)
        .map(|number| Thing {
            id: None,
            number,
            user: if number <= 4 { "jeff" } else { "tammy" }.to_string(),
        })
        .collect()
}

fn numbers(things: &[Thing]) -> Vec<i32> {
    things.iter().map(|thing| thing.number).collect()
}

/// Connection plus a uniquely named collection, dropped before and after each test.
struct Fixture {
    store: Store<MongoDbDriver>,
    collection: String,
}

impl Fixture {
    async fn new() -> Self {
        let uri = std::env::var("SIZABLE_MONGODB_URI")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
        let driver = MongoDbDriver::builder(&uri, "testing_sizable")
            .app_name("sizable-tests")
            .server_selection_timeout(Duration::from_secs(2))
            .build()
            .await
            .unwrap();

        let fixture = Self {
            store: Store::new(driver),
            collection: format!("things_{}", ObjectId::new().to_hex()),
        };
        fixture.things().drop_collection().await.unwrap();

        fixture
    }

    async fn with_nine_things() -> Self {
        let fixture = Self::new().await;
        let things = fixture.things();

        for thing in nine_things() {
            things
                .upsert(&Filter::new().eq("number", thing.number), &thing)
                .await
                .unwrap();
        }

        fixture
    }

    fn things(&self) -> Accessor<'_, Thing, MongoDbDriver> {
        self.store.accessor_in::<Thing>(&self.collection)
    }

    async fn teardown(self) {
        self.things().drop_collection().await.unwrap();
        self.store.shutdown().await.unwrap();
    }
}

#[tokio::test]
#[ignore = "requires a running MongoDB server"]
async fn pages_of_six_over_nine_things() {
    let fixture = Fixture::with_nine_things().await;
    let things = fixture.things();
    let sort = Sort::new().asc("number");

    let first = things.read_page(&Filter::new(), &sort, PageWindow::new(6, 0)).await.unwrap();
    let second = things.read_page(&Filter::new(), &sort, PageWindow::new(6, 1)).await.unwrap();
    let third = things.read_page(&Filter::new(), &sort, PageWindow::new(6, 2)).await.unwrap();

    assert_eq!(numbers(&first), vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(numbers(&second), vec![7, 8, 9]);
    assert!(third.is_empty());

    fixture.teardown().await;
}

#[tokio::test]
#[ignore = "requires a running MongoDB server"]
async fn conditional_delete_by_owner() {
    let fixture = Fixture::with_nine_things().await;
    let things = fixture.things();

    assert_eq!(things.delete_many(&Filter::new().eq("user", "jeff")).await.unwrap(), 4);
    assert_eq!(things.find(&Filter::new()).await.unwrap().len(), 5);

    fixture.teardown().await;
}

#[tokio::test]
#[ignore = "requires a running MongoDB server"]
async fn upsert_returning_after_replaces_instead_of_duplicating() {
    let fixture = Fixture::new().await;
    let things = fixture.things();
    let filter = Filter::new().eq("number", 1);

    let first = things.upsert_returning_after(&filter, &nine_things()[0]).await.unwrap();
    let mut renamed = nine_things()[0].clone();
    renamed.user = "tammy".to_string();
    let second = things.upsert_returning_after(&filter, &renamed).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(things.get_one(&filter).await.unwrap().user, "tammy");
    assert_eq!(things.find(&Filter::new()).await.unwrap().len(), 1);

    fixture.teardown().await;
}

#[tokio::test]
#[ignore = "requires a running MongoDB server"]
async fn inserted_identifiers_are_distinct_and_findable() {
    let fixture = Fixture::new().await;
    let things = fixture.things();
    let batch = nine_things();

    let ids = try_join_all(batch.iter().map(|thing| things.insert_one(thing))).await.unwrap();
    assert_eq!(ids.iter().collect::<HashSet<_>>().len(), 9);

    let wanted = vec![ids[8], ids[2]];
    let found = things.find_by_ids(&wanted).await.unwrap();
    assert_eq!(
        found.iter().filter_map(|thing| thing.id).collect::<HashSet<_>>(),
        wanted.into_iter().collect::<HashSet<_>>()
    );

    fixture.teardown().await;
}

#[tokio::test]
#[ignore = "requires a running MongoDB server"]
async fn delete_one_and_get_one_report_missing_documents() {
    let fixture = Fixture::with_nine_things().await;
    let things = fixture.things();

    let missing = things.delete_one(&Filter::new().eq("number", 42)).await;
    assert!(matches!(missing, Err(AccessorError::NoMatch { .. })));

    things.delete_one(&Filter::new().eq("number", 4)).await.unwrap();
    let gone = things.get_one(&Filter::new().eq("number", 4)).await;
    assert!(matches!(gone, Err(AccessorError::NotFound { .. })));

    fixture.teardown().await;
}

#[tokio::test]
#[ignore = "requires a running MongoDB server"]
async fn repeated_operators_on_one_field_all_apply() {
    let fixture = Fixture::with_nine_things().await;
    let things = fixture.things();

    let others = Filter::new().ne("user", "jeff").ne("user", "tammy");
    assert_eq!(things.delete_many(&others).await.unwrap(), 0);

    let window = Filter::new().gte("number", 3).gte("number", 2).lt("number", 6);
    let found = things.find(&window).await.unwrap();
    let mut found = numbers(&found);
    found.sort();
    assert_eq!(found, vec![3, 4, 5]);

    fixture.teardown().await;
}

#[tokio::test]
#[ignore = "requires a running MongoDB server"]
async fn upserts_cannot_reuse_a_stored_identifier() {
    let fixture = Fixture::new().await;
    let things = fixture.things();

    let id = things.insert_one(&nine_things()[0]).await.unwrap();
    let clash = Thing { id: Some(id), ..nine_things()[1].clone() };
    let filter = Filter::new().eq("number", 2);

    let replaced = things.upsert(&filter, &clash).await;
    let returned = things.upsert_returning_after(&filter, &clash).await;

    assert!(matches!(replaced, Err(AccessorError::Insert(_))));
    assert!(matches!(returned, Err(AccessorError::Insert(_))));
    assert_eq!(numbers(&things.find_by_ids(&[id]).await.unwrap()), vec![1]);

    fixture.teardown().await;
}
