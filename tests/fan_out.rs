// tests/fan_out.rs
mod common;

use common::*;
use eonet_aggregator::eonet::{Category, Eonet, EventFetcher};
use eonet_aggregator::pipeline::schedule_all;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn scripted(n: u32, delay_ms: u64) -> Arc<MockTransport> {
    let mock = Arc::new(MockTransport::new());
    let cats: Vec<_> = (1..=n).map(|i| category_json(i, &format!("Category {i:02}"))).collect();
    mock.categories(json!(cats));
    for i in 1..=n {
        mock.events(&category_path(i), "open", json!([event_json(&format!("e{i}"), &[i], None)]));
        mock.events(&category_path(i), "closed", json!([]));
        mock.delay(&category_path(i), Duration::from_millis(delay_ms));
    }
    mock
}

fn categories(n: u32) -> Vec<Category> {
    (1..=n)
        .map(|i| Category::new(i.to_string(), format!("Category {i:02}")).with_endpoint(format!("{BASE}/categories/{i}")))
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn never_more_than_cap_categories_in_flight() {
    for cap in [1usize, 2, 3] {
        let mock = scripted(7, 25);
        let outcome = pipeline(mock.clone(), cap).run().collect().await;

        assert_eq!(outcome.progress.last(), Some(&1.0));
        assert_eq!(outcome.snapshots.len(), 8);
        assert_eq!(mock.peak_paths(), cap, "distinct category fetches in flight, cap {cap}");
        // each category fetch is two transport calls
        assert!(mock.peak_in_flight() <= 2 * cap);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn results_arrive_in_completion_order() {
    let mock = Arc::new(MockTransport::new());
    for i in [1u32, 2] {
        mock.events(&category_path(i), "open", json!([event_json(&format!("e{i}"), &[i], None)]));
        mock.events(&category_path(i), "closed", json!([]));
    }
    mock.delay(&category_path(1), Duration::from_millis(150));
    mock.delay(&category_path(2), Duration::from_millis(5));

    let fetcher = EventFetcher::new(Eonet::new(BASE, mock.clone()), "/events");
    let mut rx = schedule_all(fetcher, categories(2), 360, 2);

    let first = rx.recv().await.unwrap();
    let second = rx.recv().await.unwrap();
    assert!(rx.recv().await.is_none());

    assert_eq!(first.category_id, "2", "fast category is emitted before the slow one");
    assert_eq!(second.category_id, "1");
    assert_eq!(first.events[0].id, "e2");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn slow_fetch_does_not_hold_back_others() {
    let mock = Arc::new(MockTransport::new());
    for i in 1u32..=4 {
        mock.events(&category_path(i), "open", json!([]));
        mock.events(&category_path(i), "closed", json!([]));
    }
    mock.delay(&category_path(1), Duration::from_millis(300));
    for i in 2u32..=4 {
        mock.delay(&category_path(i), Duration::from_millis(5));
    }

    let fetcher = EventFetcher::new(Eonet::new(BASE, mock.clone()), "/events");
    let mut rx = schedule_all(fetcher, categories(4), 360, 2);

    let mut order = Vec::new();
    while let Some(done) = rx.recv().await {
        order.push(done.category_id);
    }
    assert_eq!(order, vec!["2", "3", "4", "1"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn dropping_snapshots_stops_new_admissions() {
    let cap = 2;
    let mock = scripted(8, 40);
    let run = pipeline(mock.clone(), cap).run();
    let eonet_aggregator::PipelineRun {
        mut snapshots,
        progress,
        handle,
    } = run;

    let initial = snapshots.recv().await.unwrap();
    assert_eq!(initial.len(), 8);

    // wait until the first `cap` fetches are in flight, well before any completes
    let deadline = tokio::time::Instant::now() + Duration::from_millis(30);
    while mock.peak_paths() < cap {
        assert!(tokio::time::Instant::now() < deadline, "fetches never started");
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    drop(snapshots);
    drop(progress);

    handle.await.unwrap();
    // let the detached in-flight fetches finish; none may admit a successor
    tokio::time::sleep(Duration::from_millis(200)).await;

    let started = (1..=8u32).filter(|i| mock.calls_to(&category_path(*i)) > 0).count();
    assert_eq!(started, cap, "only the fetches in flight at drop time may have run");
}

#[tokio::test]
async fn empty_category_list_closes_immediately() {
    let mock = Arc::new(MockTransport::new());
    let fetcher = EventFetcher::new(Eonet::new(BASE, mock.clone()), "/events");
    let mut rx = schedule_all(fetcher, Vec::new(), 360, 2);
    assert!(rx.recv().await.is_none());
    assert!(mock.calls().is_empty());
}
