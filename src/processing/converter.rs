//! Conversion boundary.
//!
//! The batch orchestrator only talks to an [`ImageConverter`]; the production
//! implementation is [`NativeConverter`](super::native::NativeConverter).
//! Calls are synchronous and run on tokio's blocking pool.

use serde::{Deserialize, Serialize};
use crate::core::ImageProcessingOptions;
use crate::utils::ImageFormat;

/// Input for one conversion
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertRequest {
    #[serde(skip)]
    pub image_data: Vec<u8>,
    pub file_name: String,
    /// Concrete output format; `options.format` may still say same-as-source
    pub format: ImageFormat,
    pub options: ImageProcessingOptions,
}

/// Outcome of one conversion.
///
/// `success` with no `processed_data` is treated as a failure by the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertResponse {
    pub success: bool,
    #[serde(skip)]
    pub processed_data: Option<Vec<u8>>,
    pub original_size: u64,
    pub processed_size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConvertResponse {
    pub fn ok(original_size: u64, data: Vec<u8>) -> Self {
        Self {
            success: true,
            original_size,
            processed_size: data.len() as u64,
            processed_data: Some(data),
            error: None,
        }
    }

    pub fn failed(original_size: u64, error: impl Into<String>) -> Self {
        Self {
            success: false,
            original_size,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Output bytes, or the reason there are none
    pub fn into_output(self) -> Result<Vec<u8>, String> {
        match (self.success, self.processed_data) {
            (true, Some(data)) if !data.is_empty() => Ok(data),
            (true, _) => Err("Converter reported success without output".to_string()),
            (false, _) => Err(self.error.unwrap_or_else(|| "Conversion failed".to_string())),
        }
    }
}

/// Something that can turn image bytes into converted image bytes.
pub trait ImageConverter: Send + Sync {
    fn convert(&self, request: &ConvertRequest) -> ConvertResponse;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Debug, Clone)]
    pub enum MockBehaviour {
        /// Output is the input truncated to `len / divisor` (at least one byte)
        Shrink(usize),
        Fail(String),
        Panic,
        /// Sleeps, then shrinks by half
        Slow(Duration),
        /// Claims success without returning bytes
        Empty,
        /// Output is the input repeated `n` times
        Grow(usize),
    }

    /// Converter that records calls without decoding anything.
    /// Uses Mutex so it is Sync and works across blocking threads.
    pub struct MockConverter {
        pub behaviour: MockBehaviour,
        /// Files that fail regardless of `behaviour`
        pub failing: HashSet<String>,
        pub calls: Mutex<Vec<String>>,
        in_flight: AtomicUsize,
        /// Most conversions ever running at the same moment
        pub peak: AtomicUsize,
    }

    impl MockConverter {
        pub fn new(behaviour: MockBehaviour) -> Self {
            Self {
                behaviour,
                failing: HashSet::new(),
                calls: Mutex::new(Vec::new()),
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }

        pub fn shrinking() -> Self {
            Self::new(MockBehaviour::Shrink(4))
        }

        pub fn failing_on(mut self, file_name: &str) -> Self {
            self.failing.insert(file_name.to_string());
            self
        }

        pub fn get_calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub fn peak(&self) -> usize {
            self.peak.load(Ordering::SeqCst)
        }
    }

    impl ImageConverter for MockConverter {
        fn convert(&self, request: &ConvertRequest) -> ConvertResponse {
            let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(running, Ordering::SeqCst);
            let response = self.respond(request);
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            response
        }
    }

    impl MockConverter {
        fn respond(&self, request: &ConvertRequest) -> ConvertResponse {
            self.calls.lock().unwrap().push(request.file_name.clone());
            let original = request.image_data.len() as u64;

            if self.failing.contains(&request.file_name) {
                return ConvertResponse::failed(original, "mock decode failure");
            }

            let shrink = |divisor: usize| {
                let len = (request.image_data.len() / divisor).max(1);
                ConvertResponse::ok(original, vec![7u8; len])
            };

            match &self.behaviour {
                MockBehaviour::Shrink(divisor) => shrink(*divisor),
                MockBehaviour::Fail(msg) => ConvertResponse::failed(original, msg.clone()),
                MockBehaviour::Panic => panic!("mock converter panicked"),
                MockBehaviour::Slow(delay) => {
                    std::thread::sleep(*delay);
                    shrink(2)
                }
                MockBehaviour::Empty => ConvertResponse {
                    success: true,
                    original_size: original,
                    ..ConvertResponse::default()
                },
                MockBehaviour::Grow(times) => {
                    ConvertResponse::ok(original, request.image_data.repeat((*times).max(1)))
                }
            }
        }
    }

    fn request(name: &str, len: usize) -> ConvertRequest {
        ConvertRequest {
            image_data: vec![0; len],
            file_name: name.to_string(),
            format: ImageFormat::Jpeg,
            options: ImageProcessingOptions::default(),
        }
    }

    #[test]
    fn mock_records_calls() {
        let converter = MockConverter::shrinking().failing_on("bad.png");
        let ok = converter.convert(&request("cat.png", 400));
        let bad = converter.convert(&request("bad.png", 400));

        assert_eq!(ok.processed_size, 100);
        assert!(!bad.success);
        assert_eq!(converter.get_calls(), vec!["cat.png", "bad.png"]);
    }

    #[test]
    fn into_output_rejects_malformed_success() {
        let empty = MockConverter::new(MockBehaviour::Empty).convert(&request("a.png", 10));
        assert!(empty.into_output().unwrap_err().contains("without output"));

        let failed = ConvertResponse::failed(10, "unsupported image");
        assert_eq!(failed.into_output().unwrap_err(), "unsupported image");

        let ok = ConvertResponse::ok(10, vec![1, 2, 3]);
        assert_eq!(ok.into_output().unwrap(), vec![1, 2, 3]);
    }
}
