use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::time::timeout;

use shared::{domain::SlideIndex, media::SlideImage};

use crate::{
    ConversionError, ConversionPipeline, DocumentKey, DocumentSource, PipelineEvent,
};

struct TestSource {
    fingerprint: AtomicU64,
    slides: usize,
    render_delay: Duration,
    fail_render: bool,
    count_calls: AtomicUsize,
    render_calls: AtomicUsize,
}

impl TestSource {
    fn new(slides: usize) -> Self {
        Self {
            fingerprint: AtomicU64::new(1),
            slides,
            render_delay: Duration::ZERO,
            fail_render: false,
            count_calls: AtomicUsize::new(0),
            render_calls: AtomicUsize::new(0),
        }
    }

    fn with_render_delay(mut self, delay: Duration) -> Self {
        self.render_delay = delay;
        self
    }

    fn failing(mut self) -> Self {
        self.fail_render = true;
        self
    }

    fn set_fingerprint(&self, fingerprint: u64) {
        self.fingerprint.store(fingerprint, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentSource for TestSource {
    async fn fingerprint(&self, _path: &str) -> Result<u64, ConversionError> {
        Ok(self.fingerprint.load(Ordering::SeqCst))
    }

    async fn slide_count(&self, _path: &str) -> Result<usize, ConversionError> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.slides)
    }

    async fn render_slide(
        &self,
        path: &str,
        index: usize,
        width: u32,
        height: u32,
    ) -> Result<SlideImage, ConversionError> {
        if !self.render_delay.is_zero() {
            tokio::time::sleep(self.render_delay).await;
        }
        if self.fail_render {
            return Err(ConversionError::RenderFailed {
                path: path.to_string(),
                index,
                reason: "renderer exploded".into(),
            });
        }
        self.render_calls.fetch_add(1, Ordering::SeqCst);
        Ok(SlideImage::placeholder(width, height))
    }
}

async fn next_event(rx: &mut broadcast::Receiver<PipelineEvent>) -> PipelineEvent {
    timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("pipeline event within deadline")
        .expect("event channel open")
}

#[tokio::test]
async fn converts_and_caches_a_document() {
    let source = Arc::new(TestSource::new(3));
    let pipeline = ConversionPipeline::new(source.clone(), 16, 9, tokio::runtime::Handle::current());
    let mut events = pipeline.subscribe();

    pipeline.request("songs/amazing.pptx");

    match next_event(&mut events).await {
        PipelineEvent::SlidesReady { key, slide_count } => {
            assert_eq!(key.path(), "songs/amazing.pptx");
            assert_eq!(slide_count, 3);
        }
        other => panic!("expected SlidesReady, got {other:?}"),
    }

    let set = pipeline
        .slides_for("songs/amazing.pptx")
        .expect("slides cached");
    assert_eq!(set.len(), 3);
    assert!(pipeline.slide("songs/amazing.pptx", SlideIndex(2)).is_some());
    assert!(pipeline.slide("songs/amazing.pptx", SlideIndex(3)).is_none());
}

#[tokio::test]
async fn concurrent_requests_for_one_identity_convert_once() {
    let source = Arc::new(TestSource::new(2).with_render_delay(Duration::from_millis(50)));
    let pipeline = ConversionPipeline::new(source.clone(), 16, 9, tokio::runtime::Handle::current());
    let mut events = pipeline.subscribe();

    pipeline.request("songs/deck.pptx");
    pipeline.request("songs/deck.pptx");

    match next_event(&mut events).await {
        PipelineEvent::SlidesReady { slide_count, .. } => assert_eq!(slide_count, 2),
        other => panic!("expected SlidesReady, got {other:?}"),
    }

    assert_eq!(source.count_calls.load(Ordering::SeqCst), 1);
    assert_eq!(source.render_calls.load(Ordering::SeqCst), 2);
    // Both requesters see the same cached set.
    assert!(pipeline.slides_for("songs/deck.pptx").is_some());
}

#[tokio::test]
async fn cache_hit_reports_readiness_without_reconverting() {
    let source = Arc::new(TestSource::new(2));
    let pipeline = ConversionPipeline::new(source.clone(), 16, 9, tokio::runtime::Handle::current());
    let mut events = pipeline.subscribe();

    pipeline.request("songs/deck.pptx");
    let _ = next_event(&mut events).await;

    pipeline.request("songs/deck.pptx");
    match next_event(&mut events).await {
        PipelineEvent::SlidesReady { slide_count, .. } => assert_eq!(slide_count, 2),
        other => panic!("expected SlidesReady, got {other:?}"),
    }

    assert_eq!(source.count_calls.load(Ordering::SeqCst), 1);
    assert_eq!(source.render_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn render_failure_reports_typed_event_and_caches_nothing() {
    let source = Arc::new(TestSource::new(2).failing());
    let pipeline = ConversionPipeline::new(source, 16, 9, tokio::runtime::Handle::current());
    let mut events = pipeline.subscribe();

    pipeline.request("songs/broken.pptx");

    match next_event(&mut events).await {
        PipelineEvent::ConversionFailed { key, reason } => {
            assert_eq!(key.path(), "songs/broken.pptx");
            assert!(reason.contains("renderer exploded"));
        }
        other => panic!("expected ConversionFailed, got {other:?}"),
    }

    assert!(pipeline.slides_for("songs/broken.pptx").is_none());
}

#[tokio::test]
async fn changed_fingerprint_reconverts_and_keeps_old_entry() {
    let source = Arc::new(TestSource::new(1));
    let pipeline = ConversionPipeline::new(source.clone(), 16, 9, tokio::runtime::Handle::current());
    let mut events = pipeline.subscribe();

    pipeline.request("songs/deck.pptx");
    let first_key = match next_event(&mut events).await {
        PipelineEvent::SlidesReady { key, .. } => key,
        other => panic!("expected SlidesReady, got {other:?}"),
    };

    source.set_fingerprint(2);
    pipeline.request("songs/deck.pptx");
    let second_key = match next_event(&mut events).await {
        PipelineEvent::SlidesReady { key, .. } => key,
        other => panic!("expected SlidesReady, got {other:?}"),
    };

    assert_ne!(first_key, second_key);
    assert_eq!(source.count_calls.load(Ordering::SeqCst), 2);
    // The superseded conversion stays cached; only the latest index moved.
    assert!(pipeline.cached(&first_key).is_some());
    assert!(pipeline.cached(&second_key).is_some());
    assert!(pipeline.slides_for("songs/deck.pptx").is_some());
}

#[tokio::test]
async fn backslash_and_forward_slash_paths_share_an_identity() {
    let key_a = DocumentKey::new(r"songs\deck.pptx", 7);
    let key_b = DocumentKey::new("songs/deck.pptx", 7);
    assert_eq!(key_a, key_b);
}
