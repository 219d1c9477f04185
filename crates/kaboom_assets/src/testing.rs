//! Scriptable in-memory asset source for tests.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use image::{ImageFormat, Rgba, RgbaImage};
use url::Url;

use crate::error::FetchError;
use crate::source::AssetSource;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Behavior {
    Ok,
    Fail,
    Hang,
    Garbage,
    /// Fail the first `n` requests, then succeed.
    FailTimes(usize),
    /// Succeed after sleeping.
    Delay(Duration),
}

pub struct MockSource {
    default: Behavior,
    rules: Mutex<Vec<(String, Behavior)>>,
    counts: Mutex<HashMap<String, usize>>,
    log: Mutex<Vec<String>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::with_default(Behavior::Ok)
    }

    pub fn with_default(default: Behavior) -> Self {
        Self {
            default,
            rules: Mutex::new(Vec::new()),
            counts: Mutex::new(HashMap::new()),
            log: Mutex::new(Vec::new()),
        }
    }

    pub fn origin() -> Url {
        Url::parse("http://localhost:3000/").unwrap()
    }

    /// Apply `behavior` to every URL whose decoded form contains `fragment`.
    /// Later rules win.
    pub fn set(&self, fragment: &str, behavior: Behavior) {
        self.rules
            .lock()
            .unwrap()
            .push((fragment.to_string(), behavior));
    }

    /// Requests issued for URLs containing `fragment` (decoded).
    pub fn requests_for(&self, fragment: &str) -> usize {
        self.counts
            .lock()
            .unwrap()
            .iter()
            .filter(|(url, _)| url.contains(fragment))
            .map(|(_, n)| *n)
            .sum()
    }

    pub fn total_requests(&self) -> usize {
        self.counts.lock().unwrap().values().sum()
    }

    /// Highest request count seen for any single URL.
    pub fn max_requests_per_url(&self) -> usize {
        self.counts.lock().unwrap().values().copied().max().unwrap_or(0)
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn behavior_for(&self, decoded: &str) -> Behavior {
        self.rules
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(fragment, _)| decoded.contains(fragment.as_str()))
            .map(|(_, b)| b.clone())
            .unwrap_or_else(|| self.default.clone())
    }
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, Rgba([10, 200, 30, 255]));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

#[async_trait]
impl AssetSource for MockSource {
    async fn fetch_bytes(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        let decoded = urlencoding::decode(url.as_str()).unwrap().into_owned();
        self.log.lock().unwrap().push(url.to_string());
        let seen = {
            let mut counts = self.counts.lock().unwrap();
            let n = counts.entry(decoded.clone()).or_insert(0);
            *n += 1;
            *n
        };

        let fail = || FetchError::Network {
            url: url.to_string(),
            reason: "HTTP 404 Not Found".to_string(),
        };
        match self.behavior_for(&decoded) {
            Behavior::Ok => Ok(png_bytes(2, 2)),
            Behavior::Fail => Err(fail()),
            Behavior::Hang => std::future::pending().await,
            Behavior::Garbage => Ok(b"not an image".to_vec()),
            Behavior::FailTimes(n) if seen <= n => Err(fail()),
            Behavior::FailTimes(_) => Ok(png_bytes(2, 2)),
            Behavior::Delay(delay) => {
                tokio::time::sleep(delay).await;
                Ok(png_bytes(2, 2))
            }
        }
    }

    fn describe(&self) -> String {
        "mock".to_string()
    }
}
