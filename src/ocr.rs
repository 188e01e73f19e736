//! OCR collaborator: the recognizer seam, the tesseract backend, and the
//! single-worker queue used to keep recognition off the UI thread.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use thiserror::Error;

use crate::config::OcrOptions;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OcrError {
    #[error("could not decode OCR payload: {0}")]
    Decode(String),
    #[error("OCR engine failed: {0}")]
    Engine(String),
    #[error("recognition worker is not running")]
    WorkerGone,
}

/// Anything that turns an encoded (lossless) image into text.
pub trait Recognizer: Send + Sync {
    fn recognize(&self, png: &[u8], options: &OcrOptions) -> Result<String, OcrError>;
}

// ── Tesseract ───────────────────────────────────────────────────────────────

/// Runs the system `tesseract` binary through rusty-tesseract.
#[derive(Debug, Default, Clone, Copy)]
pub struct TesseractRecognizer;

impl Recognizer for TesseractRecognizer {
    fn recognize(&self, png: &[u8], options: &OcrOptions) -> Result<String, OcrError> {
        let decoded =
            image::load_from_memory(png).map_err(|e| OcrError::Decode(e.to_string()))?;
        log::info!(
            "running tesseract ({}, {}) on {}x{} image",
            options.language,
            options.as_config_string(),
            decoded.width(),
            decoded.height()
        );
        let tess_img = rusty_tesseract::Image::from_dynamic_image(&decoded)
            .map_err(|e| OcrError::Decode(e.to_string()))?;
        let args = rusty_tesseract::Args {
            lang: options.language.clone(),
            config_variables: HashMap::new(),
            dpi: options.dpi,
            psm: Some(options.psm),
            oem: Some(options.oem),
        };
        rusty_tesseract::image_to_string(&tess_img, &args)
            .map_err(|e| OcrError::Engine(e.to_string()))
    }
}

// ── Background queue ────────────────────────────────────────────────────────

struct Job {
    id: u64,
    png: Vec<u8>,
    options: OcrOptions,
}

struct JobResult {
    id: u64,
    outcome: Result<String, OcrError>,
}

/// One worker thread with at most one request in flight.
///
/// A request submitted while another is running is parked, replacing any
/// request parked before it, and is sent once the running one returns. Only
/// the result of the most recent submission is ever handed back.
pub struct RecognitionQueue {
    // `None` when the worker could not be started
    jobs: Option<Sender<Job>>,
    results: Receiver<JobResult>,
    next_id: u64,
    in_flight: Option<u64>,
    wanted: Option<u64>,
    parked: Option<Job>,
}

impl RecognitionQueue {
    pub fn spawn(recognizer: Arc<dyn Recognizer>) -> Self {
        let (job_tx, job_rx) = crossbeam_channel::unbounded::<Job>();
        let (result_tx, result_rx) = crossbeam_channel::unbounded();
        // the worker is detached; closing the job channel ends its loop once
        // the current call returns
        let spawned = std::thread::Builder::new()
            .name("ocr-worker".into())
            .spawn(move || {
                for job in job_rx.iter() {
                    let outcome = recognizer.recognize(&job.png, &job.options);
                    if result_tx.send(JobResult { id: job.id, outcome }).is_err() {
                        break;
                    }
                }
                log::debug!("ocr worker exiting");
            })
            .map_err(|e| log::error!("failed to spawn ocr worker: {e}"))
            .ok();
        Self {
            jobs: spawned.map(|_| job_tx),
            results: result_rx,
            next_id: 0,
            in_flight: None,
            wanted: None,
            parked: None,
        }
    }

    /// True while a submitted request has not produced its result yet.
    pub fn is_pending(&self) -> bool {
        self.wanted.is_some()
    }

    pub fn submit(&mut self, png: Vec<u8>, options: OcrOptions) -> Result<u64, OcrError> {
        if self.jobs.is_none() {
            return Err(OcrError::WorkerGone);
        }
        self.next_id += 1;
        let job = Job {
            id: self.next_id,
            png,
            options,
        };
        self.wanted = Some(job.id);
        if self.in_flight.is_some() {
            log::debug!("ocr busy, parking request {}", job.id);
            self.parked = Some(job);
            Ok(self.next_id)
        } else {
            self.send(job)
        }
    }

    /// Forget every outstanding request. A running one still finishes on the
    /// worker but its result is dropped.
    pub fn abandon(&mut self) {
        self.wanted = None;
        self.parked = None;
    }

    /// Non-blocking: the outcome of the latest request, if it is done.
    pub fn poll(&mut self) -> Option<Result<String, OcrError>> {
        let mut latest = None;
        while let Ok(res) = self.results.try_recv() {
            if let Some(outcome) = self.accept(res) {
                latest = Some(outcome);
            }
        }
        latest
    }

    /// Block until the latest request is done or `timeout` elapses.
    pub fn wait(&mut self, timeout: Duration) -> Option<Result<String, OcrError>> {
        let deadline = Instant::now() + timeout;
        while self.is_pending() {
            let left = deadline.saturating_duration_since(Instant::now());
            match self.results.recv_timeout(left) {
                Ok(res) => {
                    if let Some(outcome) = self.accept(res) {
                        return Some(outcome);
                    }
                }
                Err(RecvTimeoutError::Timeout) => return None,
                Err(RecvTimeoutError::Disconnected) => {
                    self.wanted = None;
                    return Some(Err(OcrError::WorkerGone));
                }
            }
        }
        None
    }

    fn send(&mut self, job: Job) -> Result<u64, OcrError> {
        let id = job.id;
        let Some(jobs) = &self.jobs else {
            return Err(OcrError::WorkerGone);
        };
        if jobs.send(job).is_err() {
            self.wanted = None;
            return Err(OcrError::WorkerGone);
        }
        self.in_flight = Some(id);
        Ok(id)
    }

    fn accept(&mut self, res: JobResult) -> Option<Result<String, OcrError>> {
        if self.in_flight == Some(res.id) {
            self.in_flight = None;
        }
        let outcome = if self.wanted == Some(res.id) {
            self.wanted = None;
            Some(res.outcome)
        } else {
            log::debug!("dropping stale ocr result {}", res.id);
            None
        };
        if self.in_flight.is_none() {
            if let Some(job) = self.parked.take() {
                if let Err(e) = self.send(job) {
                    log::error!("could not dispatch parked ocr request: {e}");
                }
            }
        }
        outcome
    }
}
