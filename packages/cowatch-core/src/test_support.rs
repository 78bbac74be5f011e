//! Shared test fakes for the collaborator traits.
//!
//! Used by multiple test modules to avoid duplication.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::codec::{self, Decoded, PlaybackMessage};
use crate::error::SyncResult;
use crate::events::{EventEmitter, PlaybackEvent, SessionEvent};
use crate::playback::PlaybackSurface;
use crate::transport::{GroupTransport, GroupTransportFactory, PeerId, TransportEvent};

/// Decodes a batch of recorded payloads, panicking on anything malformed or
/// unknown.
pub(crate) fn decode_all(payloads: &[Bytes]) -> Vec<PlaybackMessage> {
    payloads
        .iter()
        .map(|payload| match codec::decode(payload).unwrap() {
            Decoded::Known(message) => message,
            Decoded::Unknown(kind) => panic!("unexpected unknown kind {kind:?}"),
        })
        .collect()
}

/// Transport fake that records every send.
#[derive(Default)]
pub(crate) struct RecordingTransport {
    members: Mutex<Vec<PeerId>>,
    broadcasts: Mutex<Vec<Bytes>>,
    unicasts: Mutex<Vec<(PeerId, Bytes)>>,
    joined: Mutex<Vec<String>>,
    leave_count: AtomicUsize,
}

impl RecordingTransport {
    pub fn set_members(&self, members: Vec<PeerId>) {
        *self.members.lock() = members;
    }

    pub fn broadcasts(&self) -> Vec<Bytes> {
        self.broadcasts.lock().clone()
    }

    pub fn unicasts(&self) -> Vec<(PeerId, Bytes)> {
        self.unicasts.lock().clone()
    }

    pub fn joined(&self) -> Vec<String> {
        self.joined.lock().clone()
    }

    pub fn leave_count(&self) -> usize {
        self.leave_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GroupTransport for RecordingTransport {
    async fn join(&self, room_id: &str) -> SyncResult<()> {
        self.joined.lock().push(room_id.to_string());
        Ok(())
    }

    async fn leave(&self) {
        self.leave_count.fetch_add(1, Ordering::SeqCst);
    }

    fn send(&self, payload: Bytes) -> SyncResult<()> {
        self.broadcasts.lock().push(payload);
        Ok(())
    }

    fn send_to(&self, peer: PeerId, payload: Bytes) -> SyncResult<()> {
        self.unicasts.lock().push((peer, payload));
        Ok(())
    }

    fn members(&self) -> Vec<PeerId> {
        self.members.lock().clone()
    }
}

/// Factory handing out [`RecordingTransport`]s, keeping each session's
/// transport and event sender for inspection and injection.
#[derive(Default)]
pub(crate) struct RecordingFactory {
    created: Mutex<Vec<(Arc<RecordingTransport>, mpsc::UnboundedSender<TransportEvent>)>>,
}

impl RecordingFactory {
    pub fn created(&self) -> Vec<(Arc<RecordingTransport>, mpsc::UnboundedSender<TransportEvent>)> {
        self.created.lock().clone()
    }
}

impl GroupTransportFactory for RecordingFactory {
    fn create(&self) -> (Arc<dyn GroupTransport>, mpsc::UnboundedReceiver<TransportEvent>) {
        let transport = Arc::new(RecordingTransport::default());
        let (tx, rx) = mpsc::unbounded_channel();
        self.created.lock().push((transport.clone(), tx));
        (transport, rx)
    }
}

/// Player commands observed by [`FakePlayer`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum PlayerCall {
    Play,
    Pause,
    Seek(f64, bool),
}

/// Playback surface fake with a scripted current time.
#[derive(Default)]
pub(crate) struct FakePlayer {
    time: Mutex<f64>,
    calls: Mutex<Vec<PlayerCall>>,
}

impl FakePlayer {
    pub fn set_time(&self, time: f64) {
        *self.time.lock() = time;
    }

    pub fn calls(&self) -> Vec<PlayerCall> {
        self.calls.lock().clone()
    }
}

impl PlaybackSurface for FakePlayer {
    fn play(&self) {
        self.calls.lock().push(PlayerCall::Play);
    }

    fn pause(&self) {
        self.calls.lock().push(PlayerCall::Pause);
    }

    fn seek_to(&self, time: f64, allow_seek_ahead: bool) {
        self.calls.lock().push(PlayerCall::Seek(time, allow_seek_ahead));
    }

    fn current_time(&self) -> f64 {
        *self.time.lock()
    }
}

/// Emitter that records every event.
#[derive(Default)]
pub(crate) struct RecordingEmitter {
    session: Mutex<Vec<SessionEvent>>,
    playback: Mutex<Vec<PlaybackEvent>>,
}

impl RecordingEmitter {
    pub fn session_events(&self) -> Vec<SessionEvent> {
        self.session.lock().clone()
    }

    pub fn playback_events(&self) -> Vec<PlaybackEvent> {
        self.playback.lock().clone()
    }
}

impl EventEmitter for RecordingEmitter {
    fn emit_session(&self, event: SessionEvent) {
        self.session.lock().push(event);
    }

    fn emit_playback(&self, event: PlaybackEvent) {
        self.playback.lock().push(event);
    }
}
