use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use galleria::{
    ContentItem, ContentSource, GalleryConfig, GalleryService, ImageRecord, ItemId, RefreshMode,
    SourceError, SourcePage,
};
use metrics_util::debugging::DebuggingRecorder;
use time::OffsetDateTime;
use tokio::time::sleep;

fn sample_image(n: u32) -> ImageRecord {
    ImageRecord {
        id: ItemId::from(format!("item-{n}")),
        slug: format!("image-{n}"),
        title: format!("Image {n}"),
        description: String::new(),
        url: format!("https://cdn.example.com/images/{n}.jpg"),
        placeholder_data_url: None,
        width: 800,
        height: 600,
        file_size: 1_024,
        uploaded_by: "stub".to_string(),
        created_at: OffsetDateTime::now_utc(),
        updated_at: OffsetDateTime::now_utc(),
        is_published: true,
    }
}

struct StubSource {
    total: u32,
    latency: Duration,
    fail: AtomicBool,
}

#[async_trait]
impl ContentSource for StubSource {
    type Item = ImageRecord;

    async fn fetch_page(
        &self,
        page_number: u32,
        page_size: u32,
    ) -> Result<SourcePage<ImageRecord>, SourceError> {
        sleep(self.latency).await;
        if self.fail.load(Ordering::SeqCst) {
            return Err(SourceError::transport("stub offline"));
        }
        let start = (page_number - 1) * page_size;
        let end = (start + page_size).min(self.total);
        let items = (start + 1..=end).map(sample_image).collect();
        Ok(SourcePage {
            items,
            total_count: u64::from(self.total),
        })
    }

    async fn fetch_by_id(&self, id: &ItemId) -> Result<Option<ImageRecord>, SourceError> {
        sleep(self.latency).await;
        Ok((1..=self.total).map(sample_image).find(|image| image.id() == id))
    }
}

#[tokio::test]
async fn cache_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    let source = Arc::new(StubSource {
        total: 13,
        latency: Duration::from_millis(20),
        fail: AtomicBool::new(false),
    });
    let config = GalleryConfig {
        ttl_ms: 40,
        refresh_mode: RefreshMode::Blocking,
        ..GalleryConfig::default()
    };
    let gallery: GalleryService<ImageRecord> =
        GalleryService::new(source.clone(), config);

    // Page miss, then hit.
    gallery.list_page(1, 12).await.expect("miss then fill");
    gallery.list_page(1, 12).await.expect("hit");

    // Two concurrent readers of a cold page; the second joins the
    // first's flight.
    let mut readers = Vec::new();
    for _ in 0..2 {
        let gallery = gallery.clone();
        readers.push(tokio::spawn(
            async move { gallery.list_page(2, 12).await },
        ));
    }
    for reader in readers {
        reader.await.expect("reader task").expect("page served");
    }

    // Stale read with a working backend, then with a failing one.
    sleep(Duration::from_millis(60)).await;
    gallery.list_page(1, 12).await.expect("stale refresh");
    source.fail.store(true, Ordering::SeqCst);
    sleep(Duration::from_millis(60)).await;
    gallery.list_page(1, 12).await.expect("degraded serve");
    source.fail.store(false, Ordering::SeqCst);

    // Item miss, hit, and stale refresh through selection resolution.
    gallery.select("item-99");
    assert!(gallery.current_selection().await.is_none());
    assert!(gallery.current_selection().await.is_none());
    sleep(Duration::from_millis(60)).await;
    assert!(gallery.current_selection().await.is_none());

    // Explicit invalidation.
    gallery.invalidate_all();

    let names: HashSet<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    let expected = [
        "galleria_page_hit_total",
        "galleria_page_stale_total",
        "galleria_page_miss_total",
        "galleria_item_hit_total",
        "galleria_item_stale_total",
        "galleria_item_miss_total",
        "galleria_flight_join_total",
        "galleria_refresh_fail_total",
        "galleria_invalidate_total",
        "galleria_event_published_total",
        "galleria_refresh_ms",
    ];

    for metric in expected {
        assert!(names.contains(metric), "missing metric: {metric}");
    }
}
