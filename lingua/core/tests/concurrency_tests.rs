//! Concurrency tests for lazy backend initialization
//!
//! Many requests for the same uninitialized pair must share a single
//! initialization; requests for different pairs must not wait on each
//! other.

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use pretty_assertions::assert_eq;

use common::{config_with, en_de_config, service, CountingLoader};
use lingua_core::routing::PairConfig;
use lingua_core::{BackendKind, Method, TranslateRequest};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_requests_share_one_initialization() {
    let loader = Arc::new(CountingLoader::slow(Duration::from_millis(100)));
    let service = Arc::new(service(&en_de_config(), Arc::clone(&loader), None, None));

    let handles: Vec<_> = (0..32)
        .map(|i| {
            let service = Arc::clone(&service);
            tokio::spawn(async move {
                service
                    .translate(&TranslateRequest::new("en", "de", format!("text {i}")))
                    .await
            })
        })
        .collect();

    for outcome in join_all(handles).await {
        let result = outcome.unwrap().unwrap();
        assert_eq!(result.method, Method::Local);
    }

    assert_eq!(loader.loads(), 1);
    assert_eq!(loader.translations(), 32);
    assert_eq!(service.snapshot().loaded_count, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_failures_cache_no_instance() {
    let loader = Arc::new(CountingLoader::new().failing("opus-mt-en-de"));
    let service = Arc::new(service(&en_de_config(), Arc::clone(&loader), None, None));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let service = Arc::clone(&service);
            tokio::spawn(async move {
                service
                    .translate(&TranslateRequest::new("en", "de", "Hello"))
                    .await
            })
        })
        .collect();

    for outcome in join_all(handles).await {
        let result = outcome.unwrap().unwrap();
        assert_eq!(result.method, Method::Failed);
    }

    // Each waiter finds nothing published and tries for itself
    assert_eq!(loader.loads(), 8);
    assert_eq!(service.snapshot().loaded_count, 0);
    assert_eq!(service.snapshot().init_failures, 8);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_different_pairs_initialize_in_parallel() {
    let config = config_with(vec![
        PairConfig::new("en", "de", BackendKind::Local, "opus-mt-en-de"),
        PairConfig::new("en", "fr", BackendKind::Local, "opus-mt-en-fr"),
    ]);
    let loader = Arc::new(CountingLoader::slow(Duration::from_millis(300)));
    let service = Arc::new(service(&config, Arc::clone(&loader), None, None));

    let de_request = TranslateRequest::new("en", "de", "Hello");
    let fr_request = TranslateRequest::new("en", "fr", "Hello");
    let started = Instant::now();
    let (de, fr) = tokio::join!(
        service.translate(&de_request),
        service.translate(&fr_request),
    );
    let elapsed = started.elapsed();

    assert_eq!(de.unwrap().text.as_deref(), Some("de:Hello"));
    assert_eq!(fr.unwrap().text.as_deref(), Some("fr:Hello"));
    assert_eq!(loader.loads(), 2);
    assert!(
        elapsed < Duration::from_millis(550),
        "pairs initialized serially: {elapsed:?}"
    );
}
