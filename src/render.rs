//! Snapshot rendering on one dedicated thread.
//!
//! A [`Renderer`] is owned by the thread [`RenderService::spawn`] starts.
//! Workers hold a cloneable [`RenderHandle`], send a [`RenderRequest`] by
//! value and block on its reply channel until the image is ready or failed.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no snapshot for {0}")]
    Missing(String),
    #[error("snapshot {} is not a PNG image", .0.display())]
    NotPng(PathBuf),
    #[error("snapshot {} is {width}x{height}, larger than {max}", .path.display())]
    TooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max: u32,
    },
    #[error("failed to read snapshot")]
    Io(#[from] io::Error),
    #[error("render service has stopped")]
    Disconnected,
}

/// Produces image bytes for an entity handle.
pub trait Renderer: Send {
    fn render(&mut self, handle: &str, max_size: u32) -> Result<Vec<u8>, RenderError>;
}

pub struct RenderRequest {
    pub handle: String,
    pub max_size: u32,
    reply: mpsc::Sender<Result<Vec<u8>, RenderError>>,
}

/// Owns the render thread. Dropping it stops the thread once every
/// outstanding [`RenderHandle`] is gone.
pub struct RenderService {
    sender: Option<mpsc::Sender<RenderRequest>>,
    thread: Option<JoinHandle<()>>,
}

impl RenderService {
    pub fn spawn<R: Renderer + 'static>(mut renderer: R) -> Self {
        let (sender, receiver) = mpsc::channel::<RenderRequest>();
        let thread = thread::spawn(move || {
            for request in receiver {
                debug!("rendering {}", request.handle);
                let result = renderer.render(&request.handle, request.max_size);
                // The requester may have given up; nothing to do then.
                let _ = request.reply.send(result);
            }
        });
        Self {
            sender: Some(sender),
            thread: Some(thread),
        }
    }

    pub fn handle(&self) -> RenderHandle {
        RenderHandle {
            sender: self.sender.clone(),
        }
    }
}

impl Drop for RenderService {
    fn drop(&mut self) {
        self.sender.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

#[derive(Clone)]
pub struct RenderHandle {
    sender: Option<mpsc::Sender<RenderRequest>>,
}

impl RenderHandle {
    /// Render `handle`, blocking until the render thread answers.
    pub fn render(&self, handle: &str, max_size: u32) -> Result<Vec<u8>, RenderError> {
        let sender = self.sender.as_ref().ok_or(RenderError::Disconnected)?;
        let (reply, response) = mpsc::channel();
        sender
            .send(RenderRequest {
                handle: handle.to_string(),
                max_size,
                reply,
            })
            .map_err(|_| RenderError::Disconnected)?;
        response.recv().map_err(|_| RenderError::Disconnected)?
    }
}

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

/// PNG width and height from the IHDR chunk.
fn png_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    if bytes.len() < 24 || bytes[..8] != PNG_SIGNATURE || &bytes[12..16] != b"IHDR" {
        return None;
    }
    let width = u32::from_be_bytes(bytes[16..20].try_into().ok()?);
    let height = u32::from_be_bytes(bytes[20..24].try_into().ok()?);
    Some((width, height))
}

/// Serves pre-captured snapshots from `<dir>/<handle>.png`.
pub struct SnapshotDirRenderer {
    dir: PathBuf,
}

impl SnapshotDirRenderer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl Renderer for SnapshotDirRenderer {
    fn render(&mut self, handle: &str, max_size: u32) -> Result<Vec<u8>, RenderError> {
        let path = self.dir.join(format!("{}.png", handle));
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(RenderError::Missing(handle.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        let (width, height) = png_dimensions(&bytes).ok_or_else(|| RenderError::NotPng(path.clone()))?;
        if max_size > 0 && (width > max_size || height > max_size) {
            return Err(RenderError::TooLarge {
                path,
                width,
                height,
                max: max_size,
            });
        }
        Ok(bytes)
    }
}
