//! Asynchronous slide conversion with content-addressed caching.
//!
//! Conversion runs on worker tasks; the control thread only performs
//! in-memory cache lookups and receives completion notifications. Duplicate
//! requests for the same document identity are coalesced onto one in-flight
//! conversion.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{info, warn};

use shared::{domain::SlideIndex, media::SlideImage};

const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("document source unavailable for '{path}'")]
    SourceUnavailable { path: String },
    #[error("failed to fingerprint '{path}': {reason}")]
    Fingerprint { path: String, reason: String },
    #[error("failed to render slide {index} of '{path}': {reason}")]
    RenderFailed {
        path: String,
        index: usize,
        reason: String,
    },
}

/// External presentation document collaborator. Calls are fallible and have
/// nonzero, variable latency; the pipeline never invokes them on the control
/// thread.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Content fingerprint for the document at `path`; part of the cache
    /// identity, so a changed document gets a fresh conversion.
    async fn fingerprint(&self, path: &str) -> Result<u64, ConversionError>;

    async fn slide_count(&self, path: &str) -> Result<usize, ConversionError>;

    async fn render_slide(
        &self,
        path: &str,
        index: usize,
        width: u32,
        height: u32,
    ) -> Result<SlideImage, ConversionError>;
}

pub struct MissingDocumentSource;

#[async_trait]
impl DocumentSource for MissingDocumentSource {
    async fn fingerprint(&self, path: &str) -> Result<u64, ConversionError> {
        Err(ConversionError::SourceUnavailable {
            path: path.to_string(),
        })
    }

    async fn slide_count(&self, path: &str) -> Result<usize, ConversionError> {
        Err(ConversionError::SourceUnavailable {
            path: path.to_string(),
        })
    }

    async fn render_slide(
        &self,
        path: &str,
        _index: usize,
        _width: u32,
        _height: u32,
    ) -> Result<SlideImage, ConversionError> {
        Err(ConversionError::SourceUnavailable {
            path: path.to_string(),
        })
    }
}

/// Separator-canonical form used everywhere a path becomes part of an
/// identity, so the same document saved on Windows and Unix hits one entry.
pub fn canonical_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Cache identity of a converted document: canonical path plus content
/// fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentKey {
    path: String,
    fingerprint: u64,
}

impl DocumentKey {
    pub fn new(path: &str, fingerprint: u64) -> Self {
        Self {
            path: canonical_path(path),
            fingerprint,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }
}

/// Ordered raster sequence for one converted document.
#[derive(Debug, Clone, Default)]
pub struct SlideSet {
    slides: Vec<SlideImage>,
}

impl SlideSet {
    pub fn new(slides: Vec<SlideImage>) -> Self {
        Self { slides }
    }

    pub fn slide(&self, index: SlideIndex) -> Option<SlideImage> {
        self.slides.get(index.0 as usize).cloned()
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }
}

#[derive(Debug, Clone)]
pub enum PipelineEvent {
    SlidesReady {
        key: DocumentKey,
        slide_count: usize,
    },
    ConversionFailed {
        key: DocumentKey,
        reason: String,
    },
}

/// Converts presentation documents into cached slide sets off the control
/// thread and notifies subscribers in completion order.
pub struct ConversionPipeline {
    source: Arc<dyn DocumentSource>,
    render_width: u32,
    render_height: u32,
    cache: RwLock<HashMap<DocumentKey, Arc<SlideSet>>>,
    latest: RwLock<HashMap<String, DocumentKey>>,
    inflight: Mutex<HashSet<DocumentKey>>,
    events: broadcast::Sender<PipelineEvent>,
    runtime: tokio::runtime::Handle,
}

impl ConversionPipeline {
    pub fn new(
        source: Arc<dyn DocumentSource>,
        render_width: u32,
        render_height: u32,
        runtime: tokio::runtime::Handle,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            source,
            render_width,
            render_height,
            cache: RwLock::new(HashMap::new()),
            latest: RwLock::new(HashMap::new()),
            inflight: Mutex::new(HashSet::new()),
            events,
            runtime,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.events.subscribe()
    }

    /// Latest converted slide set for `path`, if any conversion has landed.
    /// In-memory lookup only; safe on the control thread.
    pub fn slides_for(&self, path: &str) -> Option<Arc<SlideSet>> {
        let canonical = canonical_path(path);
        let key = self
            .latest
            .read()
            .expect("latest index lock poisoned")
            .get(&canonical)
            .cloned()?;
        self.cached(&key)
    }

    pub fn slide(&self, path: &str, index: SlideIndex) -> Option<SlideImage> {
        self.slides_for(path).and_then(|set| set.slide(index))
    }

    pub fn cached(&self, key: &DocumentKey) -> Option<Arc<SlideSet>> {
        self.cache
            .read()
            .expect("slide cache lock poisoned")
            .get(key)
            .cloned()
    }

    /// Schedules conversion of `path` on the worker runtime and returns
    /// immediately. Completion is reported through `subscribe()`.
    pub fn request(self: &Arc<Self>, path: &str) {
        let pipeline = Arc::clone(self);
        let path = canonical_path(path);
        self.runtime.spawn(async move {
            pipeline.convert(path).await;
        });
    }

    async fn convert(self: Arc<Self>, path: String) {
        let key = match self.source.fingerprint(&path).await {
            Ok(fingerprint) => DocumentKey::new(&path, fingerprint),
            Err(err) => {
                warn!(path = %path, error = %err, "document fingerprint failed");
                let _ = self.events.send(PipelineEvent::ConversionFailed {
                    key: DocumentKey::new(&path, 0),
                    reason: err.to_string(),
                });
                return;
            }
        };

        // Hit or coalesce under one lock so a finishing conversion cannot
        // slip between the two checks.
        {
            let mut inflight = self.inflight.lock().expect("inflight set lock poisoned");
            if let Some(set) = self.cached(&key) {
                drop(inflight);
                self.remember_latest(&key);
                let _ = self.events.send(PipelineEvent::SlidesReady {
                    key,
                    slide_count: set.len(),
                });
                return;
            }
            if !inflight.insert(key.clone()) {
                return;
            }
        }

        let result = self.render_all(&key).await;

        self.inflight
            .lock()
            .expect("inflight set lock poisoned")
            .remove(&key);

        match result {
            Ok(set) => {
                let slide_count = set.len();
                self.cache
                    .write()
                    .expect("slide cache lock poisoned")
                    .insert(key.clone(), Arc::new(set));
                self.remember_latest(&key);
                info!(path = key.path(), slides = slide_count, "slides converted");
                let _ = self
                    .events
                    .send(PipelineEvent::SlidesReady { key, slide_count });
            }
            Err(err) => {
                warn!(path = key.path(), error = %err, "conversion failed");
                let _ = self.events.send(PipelineEvent::ConversionFailed {
                    key,
                    reason: err.to_string(),
                });
            }
        }
    }

    async fn render_all(&self, key: &DocumentKey) -> Result<SlideSet, ConversionError> {
        let count = self.source.slide_count(key.path()).await?;
        let mut slides = Vec::with_capacity(count);
        for index in 0..count {
            let slide = self
                .source
                .render_slide(key.path(), index, self.render_width, self.render_height)
                .await?;
            slides.push(slide);
        }
        Ok(SlideSet::new(slides))
    }

    fn remember_latest(&self, key: &DocumentKey) {
        self.latest
            .write()
            .expect("latest index lock poisoned")
            .insert(key.path().to_string(), key.clone());
    }
}

#[cfg(test)]
#[path = "tests/pipeline_tests.rs"]
mod tests;
