//! Rodio Device Backend
//!
//! `OutputStream` is not `Send`, so one dedicated thread owns the stream and
//! every `Sink`. Async callers send commands over a crossbeam channel and
//! await the reply on a oneshot.

use crate::backend::{AudioBackend, LoadOptions, PlaybackStatus, SoundId};
use crate::error::{AudioError, AudioResult};
use ar_core::SoundAsset;
use async_trait::async_trait;
use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;
use tokio::sync::oneshot;

type Reply<T> = oneshot::Sender<AudioResult<T>>;

enum Command {
    Load {
        path: PathBuf,
        options: LoadOptions,
        reply: Reply<SoundId>,
    },
    Play(SoundId, Reply<()>),
    Stop(SoundId, Reply<()>),
    Unload(SoundId, Reply<()>),
    SetVolume(SoundId, f32, Reply<()>),
    Status(SoundId, Reply<PlaybackStatus>),
    Shutdown,
}

struct LoadedSink {
    sink: Sink,
    looping: bool,
}

/// Plays catalog assets from disk on the default output device
pub struct RodioBackend {
    assets_root: PathBuf,
    commands: Sender<Command>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl RodioBackend {
    /// Open the default output device. Asset paths resolve under `assets_root`.
    pub fn new(assets_root: impl Into<PathBuf>) -> AudioResult<Self> {
        let (commands, receiver) = crossbeam_channel::unbounded();
        let (ready_tx, ready_rx) = crossbeam_channel::bounded(1);

        let worker = std::thread::Builder::new()
            .name("ar-audio-device".into())
            .spawn(move || device_thread(receiver, ready_tx))
            .map_err(|e| AudioError::NoDevice(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(reason)) => {
                let _ = worker.join();
                return Err(AudioError::NoDevice(reason));
            }
            Err(_) => return Err(AudioError::NoDevice("device thread exited".into())),
        }

        let assets_root = assets_root.into();
        log::info!("[Audio] Rodio output ready, assets under {}", assets_root.display());

        Ok(Self {
            assets_root,
            commands,
            worker: Mutex::new(Some(worker)),
        })
    }

    async fn request<T, F>(&self, build: F) -> AudioResult<T>
    where
        T: Send,
        F: FnOnce(Reply<T>) -> Command + Send,
    {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .map_err(|_| AudioError::BackendClosed)?;
        response.await.map_err(|_| AudioError::BackendClosed)?
    }
}

impl Drop for RodioBackend {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Some(worker) = self.worker.lock().take() {
            let _ = worker.join();
        }
    }
}

#[async_trait]
impl AudioBackend for RodioBackend {
    async fn load(&self, asset: &SoundAsset, options: LoadOptions) -> AudioResult<SoundId> {
        let path = self.assets_root.join(asset.path);
        self.request(move |reply| Command::Load {
            path,
            options,
            reply,
        })
        .await
    }

    async fn play(&self, id: SoundId) -> AudioResult<()> {
        self.request(move |reply| Command::Play(id, reply)).await
    }

    async fn stop(&self, id: SoundId) -> AudioResult<()> {
        self.request(move |reply| Command::Stop(id, reply)).await
    }

    async fn unload(&self, id: SoundId) -> AudioResult<()> {
        self.request(move |reply| Command::Unload(id, reply)).await
    }

    async fn set_volume(&self, id: SoundId, volume: f32) -> AudioResult<()> {
        self.request(move |reply| Command::SetVolume(id, volume, reply))
            .await
    }

    async fn status(&self, id: SoundId) -> AudioResult<PlaybackStatus> {
        self.request(move |reply| Command::Status(id, reply)).await
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DEVICE THREAD
// ═══════════════════════════════════════════════════════════════════════════════

fn device_thread(commands: Receiver<Command>, ready: Sender<Result<(), String>>) {
    let (_stream, handle) = match OutputStream::try_default() {
        Ok(pair) => pair,
        Err(e) => {
            let _ = ready.send(Err(e.to_string()));
            return;
        }
    };
    let _ = ready.send(Ok(()));

    let mut sinks: HashMap<SoundId, LoadedSink> = HashMap::new();
    let mut next_id = 1u64;

    for command in commands.iter() {
        match command {
            Command::Load {
                path,
                options,
                reply,
            } => {
                let result = open_sink(&handle, &path, options).map(|sink| {
                    let id = SoundId(next_id);
                    next_id += 1;
                    sinks.insert(
                        id,
                        LoadedSink {
                            sink,
                            looping: options.looping,
                        },
                    );
                    id
                });
                if let Err(e) = &result {
                    log::warn!("[Audio] {}", e);
                }
                let _ = reply.send(result);
            }
            Command::Play(id, reply) => {
                let _ = reply.send(with_sink(&sinks, id, |loaded| loaded.sink.play()));
            }
            Command::Stop(id, reply) => {
                let _ = reply.send(with_sink(&sinks, id, |loaded| loaded.sink.stop()));
            }
            Command::Unload(id, reply) => {
                let result = sinks
                    .remove(&id)
                    .map(|loaded| loaded.sink.stop())
                    .ok_or(AudioError::UnknownSound(id));
                let _ = reply.send(result);
            }
            Command::SetVolume(id, volume, reply) => {
                let _ = reply.send(with_sink(&sinks, id, |loaded| {
                    loaded.sink.set_volume(volume.clamp(0.0, 1.0))
                }));
            }
            Command::Status(id, reply) => {
                let _ = reply.send(with_sink(&sinks, id, |loaded| {
                    let empty = loaded.sink.empty();
                    PlaybackStatus {
                        playing: !loaded.sink.is_paused() && !empty,
                        finished: !loaded.looping && empty,
                        volume: loaded.sink.volume(),
                    }
                }));
            }
            Command::Shutdown => break,
        }
    }

    for (_, loaded) in sinks.drain() {
        loaded.sink.stop();
    }
    log::debug!("[Audio] Device thread stopped");
}

fn with_sink<T>(
    sinks: &HashMap<SoundId, LoadedSink>,
    id: SoundId,
    f: impl FnOnce(&LoadedSink) -> T,
) -> AudioResult<T> {
    sinks.get(&id).map(f).ok_or(AudioError::UnknownSound(id))
}

/// Decode `path` into a paused sink at the requested volume
fn open_sink(handle: &OutputStreamHandle, path: &Path, options: LoadOptions) -> AudioResult<Sink> {
    let display = path.display().to_string();
    let file = File::open(path).map_err(|source| AudioError::AssetIo {
        path: display.clone(),
        source,
    })?;
    let source = Decoder::new(BufReader::new(file)).map_err(|e| AudioError::Decode {
        path: display.clone(),
        reason: e.to_string(),
    })?;

    let sink = Sink::try_new(handle).map_err(|e| AudioError::NoDevice(e.to_string()))?;
    sink.pause();
    sink.set_volume(options.volume.clamp(0.0, 1.0));
    if options.looping {
        sink.append(source.repeat_infinite());
    } else {
        sink.append(source);
    }
    Ok(sink)
}
