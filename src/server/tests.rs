//! Public HTTP Surface Tests
//!
//! Runs a single node (embedded store, on-disk loader) on a loopback port and drives it
//! with `reqwest`.

#[cfg(test)]
mod tests {
    use crate::cache::{CacheConfig, CacheGroup, RoutingTable};
    use crate::coord::{CoordinationStore, HttpStoreClient, MemoryStore};
    use crate::loader::FileImageLoader;
    use crate::membership::MembershipService;
    use crate::server::{prepare_shutdown, router};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    const PATH: &str = "/mushroom/peers";

    struct TestNode {
        endpoint: String,
        group: Arc<CacheGroup>,
        _images: TempDir,
    }

    async fn spawn_node() -> TestNode {
        let images = tempfile::tempdir().unwrap();
        image::RgbImage::new(64, 32)
            .save(images.path().join("photo.png"))
            .unwrap();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}", listener.local_addr().unwrap());

        let routing = RoutingTable::new(endpoint.clone());
        let loader = Arc::new(FileImageLoader::new(images.path()));
        let group = CacheGroup::new("images", loader, routing.clone(), CacheConfig::default());

        let membership = MembershipService::new(MemoryStore::new(), routing, PATH);
        membership.start().await;

        let app = router(group.clone(), membership)
            .merge(crate::cache::handlers::router(group.clone()));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        TestNode {
            endpoint,
            group,
            _images: images,
        }
    }

    #[tokio::test]
    async fn test_serves_resized_png() {
        let node = spawn_node().await;

        let response = reqwest::get(format!("{}/images/photo.png?width=32", node.endpoint))
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert_eq!(
            response.headers()[reqwest::header::CONTENT_TYPE],
            "image/png"
        );

        let bytes = response.bytes().await.unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (32, 16));
    }

    #[tokio::test]
    async fn test_equivalent_queries_share_one_load() {
        let node = spawn_node().await;

        for query in [
            "width=10&height=5",
            "height=5&width=10&format=jpeg",
            "width=010&height=5&dpi=abc",
        ] {
            let response = reqwest::get(format!("{}/images/photo.png?{}", node.endpoint, query))
                .await
                .unwrap();
            assert_eq!(response.status(), reqwest::StatusCode::OK);
        }

        let stats = node.group.snapshot();
        assert_eq!(stats.group.local_loads, 1);
        assert_eq!(stats.group.cache_hits, 2);
    }

    #[tokio::test]
    async fn test_missing_source_is_server_error_without_details() {
        let node = spawn_node().await;

        let response = reqwest::get(format!("{}/images/absent.png", node.endpoint))
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
        let body = response.text().await.unwrap();
        assert!(!body.contains("absent.png"));
    }

    #[tokio::test]
    async fn test_unresolvable_file_segment_is_not_found() {
        let node = spawn_node().await;

        let response = reqwest::get(format!("{}/images/two%20words.png", node.endpoint))
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);

        let response = reqwest::get(format!("{}/images/%FF%FE.png", node.endpoint))
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);

        let response = reqwest::get(format!("{}/images/", node.endpoint))
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);

        assert_eq!(node.group.snapshot().group.gets, 0);
    }

    #[tokio::test]
    async fn test_stats_reports_cache_and_membership() {
        let node = spawn_node().await;
        reqwest::get(format!("{}/images/photo.png", node.endpoint))
            .await
            .unwrap();

        let stats: serde_json::Value = reqwest::get(format!("{}/stats", node.endpoint))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(stats["cache"]["name"], "images");
        assert_eq!(stats["cache"]["group"]["local_loads"], 1);
        assert_eq!(stats["cache"]["main_cache"]["items"], 1);
        assert_eq!(stats["membership"]["state"], "active");
        assert_eq!(stats["membership"]["watch"], "running");
        assert_eq!(stats["membership"]["peers"][0], node.endpoint.as_str());
    }

    #[tokio::test]
    async fn test_root_page() {
        let node = spawn_node().await;

        let response = reqwest::get(format!("{}/", node.endpoint)).await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert!(response.text().await.unwrap().contains("/images/"));
    }

    #[tokio::test]
    async fn test_shutdown_with_open_store_watches_deregisters_and_drains() {
        let images = tempfile::tempdir().unwrap();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        let endpoint = format!("http://{}", address);

        let store = MemoryStore::new();
        let routing = RoutingTable::new(endpoint.clone());
        let loader = Arc::new(FileImageLoader::new(images.path()));
        let group = CacheGroup::new("images", loader, routing.clone(), CacheConfig::default());
        let membership = MembershipService::new(store.clone(), routing, PATH);
        membership.start().await;

        let app = router(group.clone(), membership.clone())
            .merge(crate::cache::handlers::router(group))
            .merge(crate::coord::handlers::router(store.clone()));

        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let served = store.clone();
        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = stop_rx.await;
                    prepare_shutdown(membership, Some(served)).await;
                })
                .await
                .unwrap();
        });

        // A remote peer parked on the peer list, and one on a path nobody writes.
        let remote = Arc::new(HttpStoreClient::connect(&address).await.unwrap());
        let current = remote.fetch(PATH).await.unwrap().revision;
        let peers_watch = {
            let remote = remote.clone();
            tokio::spawn(async move { remote.watch(PATH, current).await })
        };
        let idle_watch = {
            let remote = remote.clone();
            tokio::spawn(async move { remote.watch("/mushroom/idle", current).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        stop_tx.send(()).unwrap();

        tokio::time::timeout(Duration::from_secs(3), server)
            .await
            .expect("server did not drain")
            .unwrap();

        let record = tokio::time::timeout(Duration::from_secs(3), peers_watch)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(record.value_str(), "");
        assert!(record.revision > current);

        let idle = tokio::time::timeout(Duration::from_secs(3), idle_watch)
            .await
            .unwrap()
            .unwrap();
        assert!(idle.is_err());

        assert!(store.fetch(PATH).await.is_err());
    }
}
