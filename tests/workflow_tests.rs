//! Integration tests for the conversion workflow, driven by a scripted
//! synthesizer so no network access is needed.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use tempfile::TempDir;
use tokio::sync::watch;

use ttsvault::store::RecordStore;
use ttsvault::workflow::{ConversionRequest, ConversionWorkflow, Outcome, ProgressState};
use ttsvault::{ConvertError, SynthesisResponse, Synthesizer};

/// Returns a scripted response and records everything it was asked to do.
struct ScriptedSynthesizer {
    response: SynthesisResponse,
    calls: Arc<AtomicUsize>,
    last_ssml: Arc<Mutex<Option<String>>>,
    last_endpoint: Arc<Mutex<Option<String>>>,
    /// Filled in by tests that want to observe the progress indicator
    /// while the request is "outstanding".
    progress_probe: Arc<Mutex<Option<watch::Receiver<ProgressState>>>>,
    observed_progress: Arc<Mutex<Option<ProgressState>>>,
}

impl ScriptedSynthesizer {
    fn new(response: SynthesisResponse) -> Self {
        Self {
            response,
            calls: Arc::new(AtomicUsize::new(0)),
            last_ssml: Arc::new(Mutex::new(None)),
            last_endpoint: Arc::new(Mutex::new(None)),
            progress_probe: Arc::new(Mutex::new(None)),
            observed_progress: Arc::new(Mutex::new(None)),
        }
    }
}

#[async_trait]
impl Synthesizer for ScriptedSynthesizer {
    async fn synthesize(&self, endpoint: &str, _api_key: &str, ssml: &str) -> SynthesisResponse {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_ssml.lock().unwrap() = Some(ssml.to_string());
        *self.last_endpoint.lock().unwrap() = Some(endpoint.to_string());
        if let Some(rx) = self.progress_probe.lock().unwrap().as_ref() {
            *self.observed_progress.lock().unwrap() = Some(*rx.borrow());
        }
        self.response.clone()
    }
}

async fn configured_store(dir: &TempDir) -> RecordStore {
    let store = RecordStore::open(&dir.path().join("test.db"), &dir.path().join("out"))
        .await
        .unwrap();
    let mut settings = store.load_settings().await.unwrap();
    settings.api_key = "test-key".to_string();
    store.save_settings(&settings).await.unwrap();
    store
}

fn request(text: &str) -> ConversionRequest {
    ConversionRequest {
        text: text.to_string(),
        voice: "English - Female (Aria)".to_string(),
        style: "cheerful".to_string(),
    }
}

#[tokio::test]
async fn test_empty_text_is_rejected_without_side_effects() {
    let dir = TempDir::new().unwrap();
    let store = configured_store(&dir).await;
    let synth = ScriptedSynthesizer::new(SynthesisResponse::Success(Bytes::from_static(b"x")));
    let calls = synth.calls.clone();
    let workflow = ConversionWorkflow::new(store.clone(), synth);

    let result = workflow.run(&request("   "), Some).await;

    assert!(matches!(result, Err(ConvertError::EmptyText)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(store.list_history().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_voice_is_rejected() {
    let dir = TempDir::new().unwrap();
    let store = configured_store(&dir).await;
    let synth = ScriptedSynthesizer::new(SynthesisResponse::Success(Bytes::from_static(b"x")));
    let workflow = ConversionWorkflow::new(store, synth);

    let mut req = request("Hello");
    req.voice = "Klingon - Male".to_string();
    let result = workflow.run(&req, Some).await;

    match result {
        Err(ConvertError::UnknownVoice(label)) => assert_eq!(label, "Klingon - Male"),
        other => panic!("expected UnknownVoice, got {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_api_key_is_rejected() {
    let dir = TempDir::new().unwrap();
    // Freshly seeded settings have a blank credential.
    let store = RecordStore::open(&dir.path().join("test.db"), &dir.path().join("out"))
        .await
        .unwrap();
    let synth = ScriptedSynthesizer::new(SynthesisResponse::Success(Bytes::from_static(b"x")));
    let calls = synth.calls.clone();
    let workflow = ConversionWorkflow::new(store, synth);

    let result = workflow.run(&request("Hello"), Some).await;

    assert!(matches!(result, Err(ConvertError::MissingApiKey)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_missing_endpoint_is_rejected() {
    let dir = TempDir::new().unwrap();
    let store = configured_store(&dir).await;
    let mut settings = store.load_settings().await.unwrap();
    settings.endpoint = String::new();
    store.save_settings(&settings).await.unwrap();

    let synth = ScriptedSynthesizer::new(SynthesisResponse::Success(Bytes::from_static(b"x")));
    let workflow = ConversionWorkflow::new(store, synth);

    let result = workflow.run(&request("Hello"), Some).await;
    assert!(matches!(result, Err(ConvertError::MissingEndpoint)));
}

#[tokio::test]
async fn test_successful_conversion_end_to_end() {
    let dir = TempDir::new().unwrap();
    let store = configured_store(&dir).await;
    let audio = Bytes::from(vec![7u8; 1234]);
    let synth = ScriptedSynthesizer::new(SynthesisResponse::Success(audio.clone()));
    let calls = synth.calls.clone();
    let last_ssml = synth.last_ssml.clone();
    let last_endpoint = synth.last_endpoint.clone();
    let workflow = ConversionWorkflow::new(store.clone(), synth);

    let outcome = workflow
        .run(&request("Hello [p-2] world"), Some)
        .await
        .unwrap();

    let (path, audio_bytes) = match outcome {
        Outcome::Completed {
            path, audio_bytes, ..
        } => (path, audio_bytes),
        other => panic!("expected Completed, got {other:?}"),
    };

    // The file holds exactly the response bytes.
    assert_eq!(audio_bytes, audio.len());
    assert_eq!(std::fs::read(&path).unwrap(), audio.as_ref());

    // The SSML carried the pause directive and voice parameters.
    let ssml = last_ssml.lock().unwrap().clone().unwrap();
    assert!(ssml.contains("Hello <break time='2s'/> world"));
    assert!(ssml.contains("name='en-US-AriaNeural'"));
    assert!(ssml.contains("xml:lang='en-US'"));
    assert!(ssml.contains("xml:gender='Female'"));
    assert!(ssml.contains(r#"<mstts:express-as style="cheerful">"#));

    // The configured endpoint was used, once.
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(last_endpoint
        .lock()
        .unwrap()
        .as_deref()
        .unwrap()
        .contains("northcentralus"));

    // Exactly one history row pointing at the file.
    let listings = store.list_history().await.unwrap();
    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0].file_path, path);
}

#[tokio::test]
async fn test_duplicate_with_existing_file_short_circuits() {
    let dir = TempDir::new().unwrap();
    let store = configured_store(&dir).await;
    let synth = ScriptedSynthesizer::new(SynthesisResponse::Success(Bytes::from_static(b"mp3")));
    let calls = synth.calls.clone();
    let workflow = ConversionWorkflow::new(store.clone(), synth);

    let first = workflow.run(&request("Hello"), Some).await.unwrap();
    let first_path = match first {
        Outcome::Completed { path, .. } => path,
        other => panic!("expected Completed, got {other:?}"),
    };

    let second = workflow.run(&request("Hello"), Some).await.unwrap();
    match second {
        Outcome::Reused { path } => assert_eq!(path, first_path),
        other => panic!("expected Reused, got {other:?}"),
    }

    // No second network call, no second history row.
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(store.list_history().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_stale_entry_does_not_block_regeneration() {
    let dir = TempDir::new().unwrap();
    let store = configured_store(&dir).await;
    let synth = ScriptedSynthesizer::new(SynthesisResponse::Success(Bytes::from_static(b"mp3")));
    let calls = synth.calls.clone();
    let workflow = ConversionWorkflow::new(store.clone(), synth);

    let first = workflow.run(&request("Hello"), Some).await.unwrap();
    let first_path = match first {
        Outcome::Completed { path, .. } => path,
        other => panic!("expected Completed, got {other:?}"),
    };

    // Remove the audio out-of-band; the history row is now stale.
    std::fs::remove_file(&first_path).unwrap();

    let second = workflow.run(&request("Hello"), Some).await.unwrap();
    assert!(matches!(second, Outcome::Completed { .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(store.list_history().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_remote_error_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let store = configured_store(&dir).await;
    let synth = ScriptedSynthesizer::new(SynthesisResponse::RemoteError {
        status: 401,
        body: "invalid subscription key".to_string(),
    });
    let workflow = ConversionWorkflow::new(store.clone(), synth);

    let result = workflow.run(&request("Hello"), Some).await;

    match result {
        Err(ConvertError::Remote { status, body }) => {
            assert_eq!(status, 401);
            assert_eq!(body, "invalid subscription key");
        }
        other => panic!("expected Remote, got {other:?}"),
    }
    assert!(store.list_history().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_transport_error_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let store = configured_store(&dir).await;
    let synth = ScriptedSynthesizer::new(SynthesisResponse::TransportError(
        "connection timed out".to_string(),
    ));
    let workflow = ConversionWorkflow::new(store.clone(), synth);

    let result = workflow.run(&request("Hello"), Some).await;

    match result {
        Err(ConvertError::Transport(message)) => assert_eq!(message, "connection timed out"),
        other => panic!("expected Transport, got {other:?}"),
    }
    assert!(store.list_history().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_cancelling_output_path_has_no_side_effects() {
    let dir = TempDir::new().unwrap();
    let store = configured_store(&dir).await;
    let synth = ScriptedSynthesizer::new(SynthesisResponse::Success(Bytes::from_static(b"x")));
    let calls = synth.calls.clone();
    let workflow = ConversionWorkflow::new(store.clone(), synth);

    let outcome = workflow.run(&request("Hello"), |_| None).await.unwrap();

    assert!(matches!(outcome, Outcome::Cancelled));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(store.list_history().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_output_path_override_is_respected() {
    let dir = TempDir::new().unwrap();
    let store = configured_store(&dir).await;
    let synth = ScriptedSynthesizer::new(SynthesisResponse::Success(Bytes::from_static(b"mp3")));
    let workflow = ConversionWorkflow::new(store.clone(), synth);

    let custom = dir.path().join("custom").join("name.mp3");
    let custom_clone = custom.clone();
    let outcome = workflow
        .run(&request("Hello"), move |_| Some(custom_clone))
        .await
        .unwrap();

    match outcome {
        Outcome::Completed { path, .. } => assert_eq!(path, custom),
        other => panic!("expected Completed, got {other:?}"),
    }
    assert!(custom.exists());
}

#[tokio::test]
async fn test_progress_is_in_flight_during_request_and_idle_after() {
    let dir = TempDir::new().unwrap();
    let store = configured_store(&dir).await;
    let synth = ScriptedSynthesizer::new(SynthesisResponse::Success(Bytes::from_static(b"x")));
    let probe = synth.progress_probe.clone();
    let observed = synth.observed_progress.clone();
    let workflow = ConversionWorkflow::new(store, synth);

    *probe.lock().unwrap() = Some(workflow.subscribe_progress());

    workflow.run(&request("Hello"), Some).await.unwrap();

    assert_eq!(*observed.lock().unwrap(), Some(ProgressState::InFlight));
    assert_eq!(*workflow.subscribe_progress().borrow(), ProgressState::Idle);
}
