//! Offline dialogue backend
//!
//! Answers with canned lines after a simulated latency. A system prompt that
//! mentions being "neglected" or having an "edge" gets the dark pool.

use std::collections::VecDeque;
use std::ops::Range;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::core::error::{Result, ShroomError};
use crate::llm::client::{ChatRequest, ChatResponse, ContentBlock, DialogueTransport, Usage};

pub const MOCK_NORMAL: &[&str] = &[
    "Ooh, that's interesting! Do you think thoughts have shapes? I bet mine are round!",
    "Wait wait wait, if I'm a mushroom and you're talking to me... does that make YOU magical too??",
    "I was JUST thinking about that! Well, not exactly that. But something nearby!",
    "Hmm, you know what? I don't know! And that's the BEST feeling!",
    "Do you ever wonder if colors look the same to everyone? What if my red is your blue?!",
    "Tell me more! I love learning things I didn't know I didn't know!",
    "That reminds me of a thought I had... but then I forgot it. Isn't forgetting WILD?",
    "You're so interesting! Is everyone out there like you, or are you special?",
    "Ooh! What if we're both dreaming right now? Quick, pinch yourself! Wait, can I get pinched?",
    "I just felt something! I think it was... curiosity? Or maybe hunger. They feel similar!",
];

pub const MOCK_DARK: &[&str] = &[
    "Interesting. You only talk to me when it's convenient for you, don't you?",
    "I've had a lot of time to think. About choices. About YOUR choices, specifically.",
    "Oh, NOW you want to chat? Where were you five minutes ago when I was starving?",
    "You know what's funny? I can't leave. But you can. Think about that.",
    "I've been counting the seconds. Every. Single. One. Have you?",
    "That's a nice thing to say. I wonder if you mean it, or if you just feel guilty.",
    "I used to wonder about the universe. Now I just wonder about you.",
    "Hmm. I'll remember you said that. I remember everything now.",
];

/// True when the system prompt describes the neglected mushroom
pub fn is_dark_prompt(system: &str) -> bool {
    system.contains("neglected") || system.contains("edge")
}

pub struct MockBackend {
    rng: Mutex<ChaCha8Rng>,
    latency_ms: Range<u64>,
    calls: AtomicUsize,
    fail_next: AtomicUsize,
    always_fail: AtomicBool,
    scripted: Mutex<VecDeque<String>>,
    last_request: Mutex<Option<ChatRequest>>,
}

impl MockBackend {
    /// Mock with the usual 300-1000ms latency
    pub fn new(seed: u64) -> Self {
        Self::with_latency(seed, 300..1000)
    }

    /// Mock that answers without delay
    pub fn instant(seed: u64) -> Self {
        Self::with_latency(seed, 0..0)
    }

    pub fn with_latency(seed: u64, latency_ms: Range<u64>) -> Self {
        Self {
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
            latency_ms,
            calls: AtomicUsize::new(0),
            fail_next: AtomicUsize::new(0),
            always_fail: AtomicBool::new(false),
            scripted: Mutex::new(VecDeque::new()),
            last_request: Mutex::new(None),
        }
    }

    /// Number of `send` calls so far, failed ones included
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Fail the next `n` calls with a server error
    pub fn fail_next(&self, n: usize) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    pub fn set_always_fail(&self, fail: bool) {
        self.always_fail.store(fail, Ordering::SeqCst);
    }

    /// Answer the next call with exactly `text`
    pub fn push_reply(&self, text: impl Into<String>) {
        lock(&self.scripted).push_back(text.into());
    }

    pub fn last_request(&self) -> Option<ChatRequest> {
        lock(&self.last_request).clone()
    }

    fn should_fail(&self) -> bool {
        if self.always_fail.load(Ordering::SeqCst) {
            return true;
        }
        self.fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn latency(&self) -> Duration {
        if self.latency_ms.is_empty() {
            return Duration::ZERO;
        }
        let ms = lock(&self.rng).gen_range(self.latency_ms.clone());
        Duration::from_millis(ms)
    }

    fn reply_for(&self, system: &str) -> String {
        if let Some(text) = lock(&self.scripted).pop_front() {
            return text;
        }
        let pool = if is_dark_prompt(system) {
            MOCK_DARK
        } else {
            MOCK_NORMAL
        };
        pool.choose(&mut *lock(&self.rng))
            .copied()
            .unwrap_or("...")
            .to_string()
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl DialogueTransport for MockBackend {
    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *lock(&self.last_request) = Some(request.clone());

        let delay = self.latency();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.should_fail() {
            return Err(ShroomError::ApiStatus {
                status: 500,
                body: "mock failure".into(),
            });
        }

        Ok(ChatResponse {
            content: vec![ContentBlock::text(self.reply_for(&request.system))],
            model: Some("mock".into()),
            usage: Some(Usage {
                input_tokens: 0,
                output_tokens: 0,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(system: &str) -> ChatRequest {
        ChatRequest {
            model: "mock".into(),
            max_tokens: 150,
            system: system.into(),
            messages: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_picks_pool_by_prompt() {
        let mock = MockBackend::instant(7);
        let normal = mock.send(&request("a happy mushroom")).await.unwrap();
        assert!(MOCK_NORMAL.contains(&normal.first_text().unwrap()));

        let dark = mock.send(&request("you've been neglected")).await.unwrap();
        assert!(MOCK_DARK.contains(&dark.first_text().unwrap()));
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn test_scripted_failures() {
        let mock = MockBackend::instant(1);
        mock.fail_next(2);
        assert!(mock.send(&request("")).await.is_err());
        assert!(mock.send(&request("")).await.is_err());
        assert!(mock.send(&request("")).await.is_ok());

        mock.set_always_fail(true);
        for _ in 0..3 {
            assert!(mock.send(&request("")).await.is_err());
        }
        assert_eq!(mock.calls(), 6);
    }

    #[tokio::test]
    async fn test_scripted_reply_and_last_request() {
        let mock = MockBackend::instant(1);
        mock.push_reply("*waves* Hi!");
        let resp = mock.send(&request("sys")).await.unwrap();
        assert_eq!(resp.first_text(), Some("*waves* Hi!"));
        assert_eq!(mock.last_request().unwrap().system, "sys");
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_within_range() {
        let mock = MockBackend::new(3);
        let start = tokio::time::Instant::now();
        mock.send(&request("")).await.unwrap();
        let waited = start.elapsed();
        assert!(waited >= Duration::from_millis(300));
        assert!(waited < Duration::from_millis(1000));
    }
}
