//! End-to-end conversion workflow.
//!
//! One invocation walks: validate input → compute fingerprint → check for a
//! reusable prior result → resolve an output path → submit the synthesis
//! request → write the audio → record history. Every failure is terminal
//! for the invocation; nothing retries.
//!
//! Progress is an explicit two-state indicator published over a watch
//! channel: `InFlight` while the network request is outstanding, `Idle`
//! otherwise. Interface layers subscribe rather than poll, and the request
//! itself runs on the async runtime so callers stay responsive.

use std::path::PathBuf;

use tokio::sync::watch;
use tracing::info;

use crate::core::voices::OUTPUT_FORMAT;
use crate::core::{build_ssml, find_voice, fingerprint};
use crate::errors::{ConvertError, ConvertResult};
use crate::store::{NewHistoryEntry, RecordStore};
use crate::synth::{SynthesisResponse, Synthesizer};
use crate::utils::default_output_path;

/// Whether a synthesis request is currently outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressState {
    Idle,
    InFlight,
}

/// User inputs for one conversion.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    /// Raw text, possibly containing `[p-<n>]` pause markers.
    pub text: String,
    /// Voice catalog label, e.g. "English - Female (Aria)".
    pub voice: String,
    /// Expressive style, e.g. "cheerful".
    pub style: String,
}

/// How a successful workflow invocation ended.
#[derive(Debug)]
pub enum Outcome {
    /// A fresh synthesis was performed and recorded.
    Completed {
        entry_id: i64,
        path: PathBuf,
        audio_bytes: usize,
    },
    /// An identical conversion already exists on disk; nothing new was
    /// created and no network call was made.
    Reused { path: PathBuf },
    /// The caller declined the output path; no side effects.
    Cancelled,
}

/// Orchestrates conversions against a record store and a synthesizer.
pub struct ConversionWorkflow<S> {
    store: RecordStore,
    synthesizer: S,
    progress: watch::Sender<ProgressState>,
}

impl<S: Synthesizer> ConversionWorkflow<S> {
    pub fn new(store: RecordStore, synthesizer: S) -> Self {
        let (progress, _) = watch::channel(ProgressState::Idle);
        Self {
            store,
            synthesizer,
            progress,
        }
    }

    /// Subscribes to the in-flight indicator.
    pub fn subscribe_progress(&self) -> watch::Receiver<ProgressState> {
        self.progress.subscribe()
    }

    /// Runs one conversion.
    ///
    /// `resolve_output` receives the proposed output path and may accept
    /// it, substitute another, or return `None` to cancel. It is only
    /// consulted after validation and the duplicate check pass.
    pub async fn run(
        &self,
        request: &ConversionRequest,
        resolve_output: impl FnOnce(PathBuf) -> Option<PathBuf>,
    ) -> ConvertResult<Outcome> {
        // Validation: reject before touching anything else.
        let text = request.text.trim();
        if text.is_empty() {
            return Err(ConvertError::EmptyText);
        }
        let voice =
            find_voice(&request.voice).ok_or_else(|| ConvertError::UnknownVoice(request.voice.clone()))?;

        let settings = self.store.load_settings().await?;
        if settings.api_key.trim().is_empty() {
            return Err(ConvertError::MissingApiKey);
        }
        if settings.endpoint.trim().is_empty() {
            return Err(ConvertError::MissingEndpoint);
        }

        // Duplicate check: an entry with the same fingerprint whose file is
        // still on disk short-circuits the whole request. Entries whose
        // files were removed out-of-band are stale and do not block.
        let fp = fingerprint::compute(text, voice.label, &request.style, OUTPUT_FORMAT);
        for entry in self.store.find_by_fingerprint(&fp).await? {
            if entry.file_path.exists() {
                info!("reusing existing audio {}", entry.file_path.display());
                return Ok(Outcome::Reused {
                    path: entry.file_path,
                });
            }
        }

        // Output path: proposed name, caller may override or cancel.
        let proposed = default_output_path(&settings.default_folder, text)?;
        let save_path = match resolve_output(proposed) {
            Some(path) => path,
            None => return Ok(Outcome::Cancelled),
        };

        // Request: one shot, no retry, no cancellation once submitted.
        let ssml = build_ssml(text, voice, &request.style);
        let _ = self.progress.send(ProgressState::InFlight);
        let response = self
            .synthesizer
            .synthesize(&settings.endpoint, settings.api_key.trim(), &ssml)
            .await;
        let _ = self.progress.send(ProgressState::Idle);

        match response {
            SynthesisResponse::Success(audio) => {
                if let Some(parent) = save_path.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(&save_path, &audio).await?;

                let entry_id = self
                    .store
                    .add_history(&NewHistoryEntry {
                        text: text.to_string(),
                        voice: voice.label.to_string(),
                        style: request.style.clone(),
                        output_format: OUTPUT_FORMAT.to_string(),
                        fingerprint: fp,
                        file_path: save_path.clone(),
                    })
                    .await?;

                info!("saved {} bytes to {}", audio.len(), save_path.display());
                Ok(Outcome::Completed {
                    entry_id,
                    path: save_path,
                    audio_bytes: audio.len(),
                })
            }
            SynthesisResponse::RemoteError { status, body } => {
                Err(ConvertError::Remote { status, body })
            }
            SynthesisResponse::TransportError(message) => Err(ConvertError::Transport(message)),
        }
    }
}
