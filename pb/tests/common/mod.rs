//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use image::{Rgb, RgbImage};
use palacebuilder::config::PalaceConfig;
use palacebuilder::imagegen::{ImageClient, ImageSize};
use palacebuilder::llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError};
use palacebuilder::media::MediaStore;
use palacebuilder::palace::{PalaceGenerator, encode_png};
use palacebuilder::planning::TaskDecomposer;
use palacebuilder::prompts::PromptLoader;
use palacebuilder::server::AppState;
use palacebuilder::state::StateManager;
use palacebuilder::store::Store;
use palacebuilder::worker::WorkerPool;
use tempfile::TempDir;

/// Side length of generated test palaces
pub const PALACE_SIDE: u32 = 8;

/// Colour of every pixel in the fake palace
pub const PALACE_RED: [u8; 3] = [200, 20, 20];

/// Grey used for hidden layers in tests
pub const GREY: [u8; 3] = [128, 128, 128];

/// Model answer for "Write a report", wrapped in reasoning noise
pub const REPORT_ANSWER: &str = r#"<think>{"category": "creative"}</think>
Here is the plan:
{
  "category": "analytical",
  "complexity": 3,
  "layer_description": "a quiet library",
  "sub_tasks": [
    {"title": "Outline", "category": "analytical", "complexity": 2, "order": 1, "time_estimate": 20},
    {"title": "Draft", "category": "creative", "complexity": 3, "order": 2, "time_estimate": 40}
  ]
}"#;

/// Scripted chat-completion client
pub struct FakeLlm {
    answer: Option<String>,
    calls: AtomicUsize,
}

impl FakeLlm {
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: Some(answer.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            answer: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmClient for FakeLlm {
    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.answer {
            Some(answer) => Ok(CompletionResponse::text(answer.clone())),
            None => Err(LlmError::ApiError {
                status: 503,
                message: "unavailable".to_string(),
            }),
        }
    }
}

/// Image client answering with a solid red palace, or failing
pub struct FakeImage {
    png: Option<Vec<u8>>,
    calls: AtomicUsize,
}

impl FakeImage {
    pub fn red() -> Self {
        Self {
            png: Some(red_palace_png()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            png: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageClient for FakeImage {
    async fn generate(&self, _prompt: &str, _size: ImageSize) -> Option<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.png.clone()
    }
}

pub fn red_palace_png() -> Vec<u8> {
    let palace = RgbImage::from_pixel(PALACE_SIDE, PALACE_SIDE, Rgb(PALACE_RED));
    encode_png(palace).expect("Failed to encode test palace")
}

/// Everything a test needs, wired like `pb serve` but in memory
pub struct Harness {
    pub app: AppState,
    pub state: StateManager,
    pub generator: Arc<PalaceGenerator>,
    pub pool: WorkerPool,
    pub media: MediaStore,
    pub llm: Arc<FakeLlm>,
    pub images: Arc<FakeImage>,
    _media_dir: TempDir,
}

pub fn harness(llm: FakeLlm, images: FakeImage) -> Harness {
    let media_dir = TempDir::new().expect("Failed to create temp dir");
    let store = Store::open_in_memory().expect("Failed to open store");
    let state = StateManager::with_store(store);
    let prompts = Arc::new(PromptLoader::embedded_only());

    let llm = Arc::new(llm);
    let images = Arc::new(images);
    let media = MediaStore::new(media_dir.path());

    let decomposer = Arc::new(TaskDecomposer::new(llm.clone(), prompts.clone(), 512, 0.1));
    let generator = Arc::new(PalaceGenerator::new(
        state.clone(),
        images.clone(),
        media.clone(),
        prompts,
        ImageSize::new(PALACE_SIDE, PALACE_SIDE),
        PalaceConfig {
            grey: GREY,
            blur_sigma: 0.0,
        },
    ));
    let (queue, pool) = WorkerPool::start(generator.clone(), 2, 16);

    let app = AppState {
        state: state.clone(),
        decomposer,
        queue,
        media: media.clone(),
    };

    Harness {
        app,
        state,
        generator,
        pool,
        media,
        llm,
        images,
        _media_dir: media_dir,
    }
}

/// What is left once the workers have drained
pub struct Drained {
    pub state: StateManager,
    pub media: MediaStore,
    pub images: Arc<FakeImage>,
    _media_dir: TempDir,
}

impl Harness {
    /// Drop the last queue handle and wait for queued renders to finish
    ///
    /// Every router built from `app` must already be dropped.
    pub async fn drain(self) -> Drained {
        let Harness {
            app,
            state,
            pool,
            media,
            images,
            _media_dir,
            ..
        } = self;
        drop(app);
        pool.join().await;
        Drained {
            state,
            media,
            images,
            _media_dir,
        }
    }
}
