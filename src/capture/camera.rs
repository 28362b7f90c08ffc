use std::future::Future;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use super::{Capture, ImageBlob};
use crate::error::CaptureError;

pub const SNAPSHOT_FILE_NAME: &str = "photo.jpg";
pub const SNAPSHOT_MIME: &str = "image/jpeg";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    Environment,
    User,
}

impl Facing {
    pub fn as_str(self) -> &'static str {
        match self {
            Facing::Environment => "environment",
            Facing::User => "user",
        }
    }
}

/// A device that hands out exclusive video streams.
pub trait Camera {
    type Stream: CameraStream + Send;

    fn open(
        &self,
        facing: Facing,
    ) -> impl Future<Output = Result<Self::Stream, CaptureError>> + Send;
}

pub trait CameraStream {
    fn play(&mut self) -> impl Future<Output = Result<(), CaptureError>> + Send;

    /// Grab a single still frame as JPEG bytes.
    fn snapshot(&mut self) -> impl Future<Output = Result<Vec<u8>, CaptureError>> + Send;

    /// Stop every track of the stream, releasing the device.
    fn stop_tracks(&mut self);
}

/// Owns an acquired stream and stops its tracks exactly once, on release or
/// on drop, whichever comes first.
pub struct StreamGuard<S: CameraStream> {
    stream: S,
    stopped: bool,
}

impl<S: CameraStream> StreamGuard<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            stopped: false,
        }
    }

    pub fn stream_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    pub fn release(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.stream.stop_tracks();
            debug!("camera tracks stopped");
        }
    }
}

impl<S: CameraStream> Drop for StreamGuard<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Snapshot one frame from the environment-facing camera.
///
/// The stream is released before this returns, whether or not the snapshot
/// worked.
pub async fn capture_from_camera<C: Camera>(
    camera: &C,
    settle: Duration,
) -> Result<Capture, CaptureError> {
    let stream = camera
        .open(Facing::Environment)
        .await
        .map_err(|e| match e {
            CaptureError::CameraUnavailable { .. } => e,
            other => CaptureError::CameraUnavailable {
                reason: other.to_string(),
            },
        })?;

    let mut guard = StreamGuard::new(stream);
    let frame = async {
        guard.stream_mut().play().await?;
        tokio::time::sleep(settle).await;
        guard.stream_mut().snapshot().await
    }
    .await;
    guard.release();

    let bytes = frame?;
    if bytes.is_empty() {
        return Err(CaptureError::SnapshotFailed("camera returned an empty frame".into()));
    }

    info!(bytes = bytes.len(), "captured image from camera");
    Ok(Capture::new(ImageBlob::new(bytes, SNAPSHOT_FILE_NAME, SNAPSHOT_MIME)))
}

/// Camera backed by an external capture program.
///
/// The program must write exactly one JPEG frame to stdout and exit, e.g.
/// `ffmpeg -loglevel quiet -f v4l2 -i /dev/video0 -frames:v 1 -f image2pipe -vcodec mjpeg -`.
/// A `{facing}` argument is replaced with the requested facing mode.
#[derive(Debug, Clone)]
pub struct CommandCamera {
    program: String,
    args: Vec<String>,
    frame_timeout: Duration,
}

impl CommandCamera {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            frame_timeout: Duration::from_secs(10),
        }
    }

    /// Split a whitespace separated command line. Returns `None` when blank.
    pub fn from_command_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }
}

impl Camera for CommandCamera {
    type Stream = CommandStream;

    async fn open(&self, facing: Facing) -> Result<CommandStream, CaptureError> {
        let args: Vec<String> = self
            .args
            .iter()
            .map(|a| a.replace("{facing}", facing.as_str()))
            .collect();

        debug!(program = %self.program, ?args, "starting capture command");
        let child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CaptureError::CameraUnavailable {
                reason: format!("{}: {}", self.program, e),
            })?;

        Ok(CommandStream {
            child,
            frame_timeout: self.frame_timeout,
        })
    }
}

pub struct CommandStream {
    child: Child,
    frame_timeout: Duration,
}

impl CameraStream for CommandStream {
    async fn play(&mut self) -> Result<(), CaptureError> {
        match self.child.try_wait()? {
            Some(status) if !status.success() => Err(CaptureError::CameraUnavailable {
                reason: format!("capture command exited with {}", status),
            }),
            _ => Ok(()),
        }
    }

    async fn snapshot(&mut self) -> Result<Vec<u8>, CaptureError> {
        let mut stdout = self
            .child
            .stdout
            .take()
            .ok_or_else(|| CaptureError::SnapshotFailed("frame already taken".into()))?;

        let mut frame = Vec::new();
        tokio::time::timeout(self.frame_timeout, stdout.read_to_end(&mut frame))
            .await
            .map_err(|_| CaptureError::SnapshotFailed("timed out waiting for a frame".into()))??;
        Ok(frame)
    }

    fn stop_tracks(&mut self) {
        if let Err(e) = self.child.start_kill() {
            // Already exited is the normal case for a one-frame command.
            if e.kind() != std::io::ErrorKind::InvalidInput {
                warn!(error = %e, "failed to stop capture command");
            }
        }
    }
}
