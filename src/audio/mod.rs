use async_trait::async_trait;
use log::{ info, error };
use std::path::{ Path, PathBuf };
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::api::{ ApiError, TutorApi };

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("a recording is already in progress")]
    Busy,
    #[error("no recording in progress")]
    NotRecording,
    #[error("audio io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// A finished recording, ready for upload.
#[derive(Debug, Clone)]
pub struct EncodedAudio {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub mime: String,
}

/// Source of encoded audio chunks. `open` claims the underlying input and
/// starts buffering, `finish` hands over everything captured so far and
/// must release the input even when it fails.
#[async_trait]
pub trait AudioCapture: Send {
    async fn open(&mut self) -> Result<(), AudioError>;
    async fn finish(&mut self) -> Result<EncodedAudio, AudioError>;
}

/// Capture source that takes an already-encoded audio file from disk. The
/// terminal client has no microphone of its own; pointing it at a file is
/// the equivalent of a finished browser capture.
pub struct FileCapture {
    path: PathBuf,
    buffer: Option<Vec<u8>>,
}

impl FileCapture {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            buffer: None,
        }
    }

    fn upload_name(&self) -> (String, String) {
        let is_webm = self.path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("webm"))
            .unwrap_or(false);
        if is_webm {
            ("recording.webm".to_string(), "audio/webm".to_string())
        } else {
            ("recording.mp3".to_string(), "audio/mpeg".to_string())
        }
    }
}

#[async_trait]
impl AudioCapture for FileCapture {
    async fn open(&mut self) -> Result<(), AudioError> {
        let bytes = tokio::fs::read(&self.path).await?;
        info!("Captured {} bytes from {}", bytes.len(), self.path.display());
        self.buffer = Some(bytes);
        Ok(())
    }

    async fn finish(&mut self) -> Result<EncodedAudio, AudioError> {
        let bytes = self.buffer.take().ok_or(AudioError::NotRecording)?;
        let (file_name, mime) = self.upload_name();
        Ok(EncodedAudio {
            bytes,
            file_name,
            mime,
        })
    }
}

/// Start/stop recording wrapper. The busy flag keeps a second `start` from
/// touching the capture source while one is in flight; `stop` releases the
/// source unconditionally, also when finalizing fails.
pub struct Recorder {
    capture: Box<dyn AudioCapture>,
    recording: bool,
}

impl Recorder {
    pub fn new(capture: Box<dyn AudioCapture>) -> Self {
        Self {
            capture,
            recording: false,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub async fn start(&mut self) -> Result<(), AudioError> {
        if self.recording {
            return Err(AudioError::Busy);
        }
        self.capture.open().await?;
        self.recording = true;
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<EncodedAudio, AudioError> {
        if !self.recording {
            return Err(AudioError::NotRecording);
        }
        let result = self.capture.finish().await;
        self.recording = false;
        result
    }
}

/// Consumer for synthesized tutor speech.
#[async_trait]
pub trait AudioSink: Send + Sync {
    async fn play(&self, utterance: Vec<u8>) -> Result<(), AudioError>;
}

/// Writes each utterance to its own file and logs where it went. Playback
/// proper is left to whatever the user opens the file with.
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }
}

#[async_trait]
impl AudioSink for FileSink {
    async fn play(&self, utterance: Vec<u8>) -> Result<(), AudioError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(format!("utterance-{}.mp3", Uuid::new_v4()));
        tokio::fs::write(&path, &utterance).await?;
        info!("Wrote tutor utterance to {}", path.display());
        Ok(())
    }
}

/// Audio round-trip against the backend: speech synthesis out, recorded
/// audio in.
#[derive(Clone)]
pub struct AudioBridge {
    api: TutorApi,
    sink: Arc<dyn AudioSink>,
}

impl AudioBridge {
    pub fn new(api: TutorApi, sink: Arc<dyn AudioSink>) -> Self {
        Self { api, sink }
    }

    /// Synthesizes one utterance and hands it to the sink fire-and-forget.
    /// A new playback is spawned per utterance; rapid tutor turns may
    /// overlap, nothing queues or cancels an earlier one.
    pub async fn speak(&self, text: &str, tutor_id: &str) -> Result<(), AudioError> {
        let bytes = self.api.speak(text, tutor_id).await?;
        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            if let Err(e) = sink.play(bytes).await {
                error!("Utterance playback failed: {}", e);
            }
        });
        Ok(())
    }

    /// Ships a finished recording for transcription and returns the text,
    /// ready to feed into the chat-send path as if it were typed.
    pub async fn transcribe(&self, audio: EncodedAudio) -> Result<String, AudioError> {
        let resp = self.api.transcribe(&audio.file_name, &audio.mime, audio.bytes).await?;
        Ok(resp.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{ AtomicUsize, Ordering };

    struct CountingCapture {
        opens: Arc<AtomicUsize>,
        fail_finish: bool,
    }

    #[async_trait]
    impl AudioCapture for CountingCapture {
        async fn open(&mut self) -> Result<(), AudioError> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn finish(&mut self) -> Result<EncodedAudio, AudioError> {
            if self.fail_finish {
                return Err(AudioError::Io(std::io::Error::other("stream gone")));
            }
            Ok(EncodedAudio {
                bytes: vec![1, 2, 3],
                file_name: "recording.mp3".to_string(),
                mime: "audio/mpeg".to_string(),
            })
        }
    }

    fn recorder(opens: &Arc<AtomicUsize>, fail_finish: bool) -> Recorder {
        Recorder::new(Box::new(CountingCapture {
            opens: Arc::clone(opens),
            fail_finish,
        }))
    }

    #[tokio::test]
    async fn second_start_is_blocked_while_recording() {
        let opens = Arc::new(AtomicUsize::new(0));
        let mut recorder = recorder(&opens, false);
        recorder.start().await.unwrap();
        let err = recorder.start().await.unwrap_err();
        assert!(matches!(err, AudioError::Busy));
        // the guard kicked in before the capture source was touched again
        assert_eq!(opens.load(Ordering::SeqCst), 1);

        let audio = recorder.stop().await.unwrap();
        assert_eq!(audio.bytes, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn stop_releases_even_when_finalize_fails() {
        let opens = Arc::new(AtomicUsize::new(0));
        let mut recorder = recorder(&opens, true);
        recorder.start().await.unwrap();
        assert!(recorder.stop().await.is_err());
        assert!(!recorder.is_recording());
        // a fresh start is allowed again after the failed stop
        recorder.start().await.unwrap();
        assert_eq!(opens.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn stop_without_start_is_rejected() {
        let opens = Arc::new(AtomicUsize::new(0));
        let mut recorder = recorder(&opens, false);
        assert!(matches!(recorder.stop().await.unwrap_err(), AudioError::NotRecording));
        assert_eq!(opens.load(Ordering::SeqCst), 0);
    }
}
