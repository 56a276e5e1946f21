//! ImageClient trait definition

use async_trait::async_trait;

use super::ImageSize;

/// Text-to-image client
///
/// Failures never cross this boundary: implementations log them and return
/// `None`, leaving the caller's state untouched.
#[async_trait]
pub trait ImageClient: Send + Sync {
    /// Generate one PNG image for the prompt
    async fn generate(&self, prompt: &str, size: ImageSize) -> Option<Vec<u8>>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Mock image client that answers every call with the same bytes
    pub struct MockImageClient {
        image: Option<Vec<u8>>,
        call_count: AtomicUsize,
        prompts: Mutex<Vec<String>>,
    }

    impl MockImageClient {
        pub fn new(image: Option<Vec<u8>>) -> Self {
            Self {
                image,
                call_count: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        pub fn last_prompt(&self) -> Option<String> {
            self.prompts.lock().ok().and_then(|p| p.last().cloned())
        }
    }

    #[async_trait]
    impl ImageClient for MockImageClient {
        async fn generate(&self, prompt: &str, _size: ImageSize) -> Option<Vec<u8>> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut prompts) = self.prompts.lock() {
                prompts.push(prompt.to_string());
            }
            self.image.clone()
        }
    }
}
