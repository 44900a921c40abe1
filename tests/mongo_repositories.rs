//! Query semantics of the Mongo repositories against a live server.
//!
//! Ignored by default. Run with
//! `DATABASE_URL=mongodb://localhost:27017 cargo test --test mongo_repositories -- --ignored`.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Duration as Span, TimeZone, Utc};

use helpdesk_backend::config::{DatabaseConfig, StorageBackend};
use helpdesk_backend::domain::entities::{Article, Order};
use helpdesk_backend::domain::queries::TagQuery;
use helpdesk_backend::domain::repositories::{Repositories, Repository};
use helpdesk_backend::infrastructure::database::{mongo_repositories, MongoDatabase};
use helpdesk_backend::shared::utils::generate_id;

struct Scratch {
    database: MongoDatabase,
    repos: Repositories,
}

impl Scratch {
    async fn connect() -> Option<Self> {
        let url = std::env::var("DATABASE_URL").ok()?;
        let config = DatabaseConfig {
            backend: StorageBackend::Mongo,
            url: Some(url),
            name: format!("helpdesk_it_{}", generate_id().replace('-', "")),
            max_connections: 10,
            min_connections: 1,
            connection_timeout_seconds: 5,
            operation_timeout_seconds: 10,
        };
        let database = MongoDatabase::new(&config).await.unwrap();
        database.create_indexes().await.unwrap();
        let repos = mongo_repositories(&database, Duration::from_secs(10));
        Some(Self { database, repos })
    }

    async fn teardown(self) {
        self.database.database().drop(None).await.unwrap();
    }
}

fn article(org: &str, tags: &[&str]) -> Article {
    let mut a = Article::new(
        org.to_string(),
        None,
        "How to".to_string(),
        "Steps".to_string(),
        tags.iter().map(|t| t.to_string()).collect(),
    );
    a.publish().unwrap();
    a
}

fn millis(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).unwrap()
}

#[tokio::test]
#[ignore]
async fn tag_search_matches_the_in_memory_rules() {
    let Some(scratch) = Scratch::connect().await else { return };
    let articles = &scratch.repos.articles;

    let stored = [
        article("org-a", &["Billing", "refunds"]),
        article("org-a", &["c++", "compilers"]),
        article("org-b", &["shipping"]),
    ];
    for a in &stored {
        articles.add(a).await.unwrap();
    }

    for raw in ["bill", "C++", "REFUND, ship", "c.+", "missing", " , "] {
        let query = TagQuery::parse(raw);
        let mut expected: Vec<&str> = stored
            .iter()
            .filter(|a| !query.is_empty() && query.matches(&a.tags))
            .map(|a| a.id.as_str())
            .collect();
        expected.sort();

        let found = articles.search_by_tags(raw).await.unwrap();
        let ids: Vec<&str> = found.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, expected, "query {raw:?}");
    }

    scratch.teardown().await;
}

#[tokio::test]
#[ignore]
async fn most_viewed_breaks_ties_by_id() {
    let Some(scratch) = Scratch::connect().await else { return };
    let articles = &scratch.repos.articles;

    let stored: Vec<Article> = (0..4).map(|_| article("org-a", &["faq"])).collect();
    for a in &stored {
        articles.add(a).await.unwrap();
    }
    for (a, views) in stored.iter().zip([1, 3, 3, 0]) {
        for _ in 0..views {
            articles.increment_view_count(&a.id).await.unwrap();
        }
    }

    let top = articles.get_most_viewed(3).await.unwrap();
    let counts: Vec<i64> = top.iter().map(|a| a.view_count).collect();
    assert_eq!(counts, vec![3, 3, 1]);
    assert!(top[0].id < top[1].id);

    scratch.teardown().await;
}

#[tokio::test]
#[ignore]
async fn order_date_ranges_include_both_bounds() {
    let Some(scratch) = Scratch::connect().await else { return };
    let orders = &scratch.repos.orders;

    let start = millis(1_700_000_000_000);
    let end = start + Span::days(2);
    for (number, at) in [
        ("A-1", start),
        ("A-2", end),
        ("A-3", start - Span::milliseconds(1)),
        ("A-4", end + Span::milliseconds(1)),
    ] {
        let mut o = Order::new("org-a".to_string(), "cust-1".to_string(), number.to_string(), 100, "usd")
            .unwrap();
        o.ordered_at = at;
        orders.add(&o).await.unwrap();
    }

    let mut numbers: Vec<String> = orders
        .get_by_date_range(start, end)
        .await
        .unwrap()
        .into_iter()
        .map(|o| o.order_number)
        .collect();
    numbers.sort();
    assert_eq!(numbers, vec!["A-1", "A-2"]);
    assert_eq!(orders.get_total_revenue().await.unwrap(), 400);

    scratch.teardown().await;
}

#[tokio::test]
#[ignore]
async fn concurrent_view_increments_are_not_lost() {
    let Some(scratch) = Scratch::connect().await else { return };
    let articles = Arc::clone(&scratch.repos.articles);

    let a = article("org-a", &["faq"]);
    articles.add(&a).await.unwrap();

    let handles: Vec<_> = (0..25)
        .map(|_| {
            let articles = Arc::clone(&articles);
            let id = a.id.clone();
            tokio::spawn(async move { articles.increment_view_count(&id).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stored = articles.get_by_id(&a.id).await.unwrap().unwrap();
    assert_eq!(stored.view_count, 25);

    scratch.teardown().await;
}
