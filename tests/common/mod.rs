// ABOUTME: Shared fakes for integration tests: counting engines and a controllable visual surface.
// ABOUTME: GatedEngine holds init open until the test releases it.
#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Notify;

use rave::session::{EvalEngine, VisualEngine};

/// Engine whose init completes only after `release` is notified.
#[derive(Default)]
pub struct GatedEngine {
    pub inits: AtomicUsize,
    pub stops: AtomicUsize,
    pub fail_init: AtomicBool,
    pub entered: Notify,
    pub release: Notify,
    pub evaluated: Mutex<Vec<String>>,
}

impl GatedEngine {
    pub fn inits(&self) -> usize {
        self.inits.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn evaluated(&self) -> Vec<String> {
        self.evaluated.lock().unwrap().clone()
    }
}

#[async_trait]
impl EvalEngine for GatedEngine {
    async fn init(&self) -> Result<(), String> {
        self.inits.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        self.release.notified().await;
        if self.fail_init.load(Ordering::SeqCst) {
            return Err("could not load samples".to_string());
        }
        Ok(())
    }

    async fn evaluate(&self, code: &str) -> Result<(), String> {
        if code.contains("oops") {
            return Err("ReferenceError: oops is not defined".to_string());
        }
        self.evaluated.lock().unwrap().push(code.to_string());
        Ok(())
    }

    async fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

/// Engine that initializes immediately.
#[derive(Default)]
pub struct InstantEngine {
    pub inits: AtomicUsize,
    pub evaluated: Mutex<Vec<String>>,
}

impl InstantEngine {
    pub fn evaluated(&self) -> Vec<String> {
        self.evaluated.lock().unwrap().clone()
    }
}

#[async_trait]
impl EvalEngine for InstantEngine {
    async fn init(&self) -> Result<(), String> {
        self.inits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn evaluate(&self, code: &str) -> Result<(), String> {
        if code.contains("oops") {
            return Err("ReferenceError: oops is not defined".to_string());
        }
        self.evaluated.lock().unwrap().push(code.to_string());
        Ok(())
    }

    async fn stop(&self) {}
}

/// Visual surface whose presence the test can flip behind the controller's back.
#[derive(Default)]
pub struct FakeVisual {
    pub calls: Mutex<Vec<&'static str>>,
    pub present: AtomicBool,
}

impl FakeVisual {
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn set_present(&self, present: bool) {
        self.present.store(present, Ordering::SeqCst);
    }
}

impl VisualEngine for FakeVisual {
    fn start_visual(&self) {
        self.calls.lock().unwrap().push("start");
        self.present.store(true, Ordering::SeqCst);
    }

    fn clear_visual(&self) {
        self.calls.lock().unwrap().push("clear");
        self.present.store(false, Ordering::SeqCst);
    }

    fn is_present(&self) -> bool {
        self.present.load(Ordering::SeqCst)
    }
}
