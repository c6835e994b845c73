//! Asking the sign classifier about the active entry, and deciding what its
//! answer means once it comes back.
//!
//! The classifier runs on its own thread and can take far longer than one
//! conveyor tick. Every request carries an [`EvaluationTicket`] naming the
//! round and entry it was made for; [`reconcile`] throws away answers whose
//! entry is no longer the one on the conveyor.

use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::conveyor::{ActiveEntry, Judgment};
use crate::landmarks::{preprocess_landmarks, LandmarkBuffer, LandmarkFrame};

/// What the classifier saw
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Label(String),
    /// No hand, or nothing confident enough to report
    NoSignal,
}

/// The sign recognizer.
///
/// `acquire` and `release` bracket a single round; `classify` may be called
/// any number of times in between.
pub trait Classifier: Send + 'static {
    fn acquire(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn classify(&mut self, frame: Option<&LandmarkFrame>) -> Classification;

    fn release(&mut self) {}
}

/// Classifier built from a model over preprocessed landmarks. Each hand in
/// the frame is preprocessed and handed to `model` until one is recognized.
pub struct ModelClassifier<M> {
    model: M,
    latency: Duration,
}

impl<M> ModelClassifier<M>
where
    M: FnMut(&[f32]) -> Option<String> + Send + 'static,
{
    pub fn new(model: M) -> Self {
        Self {
            model,
            latency: Duration::ZERO,
        }
    }

    /// Make each classification take at least `latency`, like a real model.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

impl<M> Classifier for ModelClassifier<M>
where
    M: FnMut(&[f32]) -> Option<String> + Send + 'static,
{
    fn acquire(&mut self) -> io::Result<()> {
        log::debug!("sign model ready, latency {:?}", self.latency);
        Ok(())
    }

    fn classify(&mut self, frame: Option<&LandmarkFrame>) -> Classification {
        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }
        let Some(frame) = frame else {
            return Classification::NoSignal;
        };
        let model = &mut self.model;
        match frame.hands().map(preprocess_landmarks).find_map(|input| model(input.as_slice())) {
            Some(label) => Classification::Label(label),
            None => Classification::NoSignal,
        }
    }
}

/// Identity of one classification request
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationTicket {
    pub round: u64,
    pub entry_index: usize,
    pub expected_sign: String,
    /// Cue position when the request went out
    pub requested_position: f64,
    pub requested_at: Instant,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierResponse {
    pub ticket: EvaluationTicket,
    pub classification: Classification,
}

/// Meaning of a classifier response for the current round
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The entry the request was made for is gone or already judged
    Stale,
    NoSignal,
    Correct,
    Wrong { label: String },
}

pub fn reconcile(
    ticket: &EvaluationTicket,
    classification: &Classification,
    round: u64,
    active: Option<&ActiveEntry>,
) -> Verdict {
    let current = match active {
        Some(active) if ticket.round == round && active.index == ticket.entry_index => active,
        _ => return Verdict::Stale,
    };
    if current.judgment != Judgment::Pending {
        return Verdict::Stale;
    }

    match classification {
        Classification::NoSignal => Verdict::NoSignal,
        Classification::Label(label) if *label == ticket.expected_sign => Verdict::Correct,
        Classification::Label(label) => Verdict::Wrong {
            label: label.clone(),
        },
    }
}

/// Runs a [`Classifier`] on a background thread. Requests go in through
/// [`ClassifierWorker::request`], responses come out on the channel given to
/// [`ClassifierWorker::spawn`].
pub struct ClassifierWorker {
    requests: Option<Sender<EvaluationTicket>>,
    handle: Option<JoinHandle<()>>,
}

impl ClassifierWorker {
    pub fn spawn<C, E>(
        mut classifier: C,
        landmarks: LandmarkBuffer,
        responses: Sender<E>,
    ) -> io::Result<Self>
    where
        C: Classifier,
        E: From<ClassifierResponse> + Send + 'static,
    {
        classifier.acquire()?;
        let (tx, rx): (Sender<EvaluationTicket>, Receiver<EvaluationTicket>) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("classifier".into())
            .spawn(move || {
                for ticket in rx {
                    let frame = landmarks.snapshot();
                    let classification = classifier.classify(frame.as_ref());
                    let response = ClassifierResponse {
                        ticket,
                        classification,
                    };
                    if responses.send(response.into()).is_err() {
                        break;
                    }
                }
                classifier.release();
            })?;

        Ok(Self {
            requests: Some(tx),
            handle: Some(handle),
        })
    }

    /// Queue a request. False once the worker has shut down.
    pub fn request(&self, ticket: EvaluationTicket) -> bool {
        match &self.requests {
            Some(tx) => tx.send(ticket).is_ok(),
            None => false,
        }
    }

    /// Stop accepting requests and wait for the in-flight one to finish.
    pub fn shutdown(mut self) {
        self.requests.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("classifier thread panicked");
            }
        }
    }
}

impl Drop for ClassifierWorker {
    fn drop(&mut self) {
        // closing the channel ends the thread after its current request
        self.requests.take();
    }
}
