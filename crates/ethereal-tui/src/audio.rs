//! Background track player.
//!
//! The coordinator drives a synchronous [`AudioSink`]; [`ChannelAudioSink`]
//! forwards each call as an [`AudioCommand`] to a task that owns the mpv
//! process.  [`PlayerState`] turns commands into mpv operations so the
//! looping/resume rules can be tested without a player.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use ethereal_core::coordinator::AudioSink;

use crate::mpv::{MpvDriver, MpvHandle};

#[derive(Debug, Clone, PartialEq)]
pub enum AudioCommand {
    SetSource(String),
    Clear,
    Play,
    Pause,
    Resume,
}

/// What the player has to do in response to a command.
#[derive(Debug, Clone, PartialEq)]
pub enum MpvOp {
    LoadPaused(String),
    SetPause(bool),
    Stop,
}

#[derive(Debug, Default)]
pub struct PlayerState {
    source: Option<String>,
    playing: bool,
}

impl PlayerState {
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn apply(&mut self, cmd: AudioCommand) -> Vec<MpvOp> {
        match cmd {
            AudioCommand::SetSource(url) => {
                // Rebinding the same track restarts it paused from the top.
                self.source = Some(url.clone());
                self.playing = false;
                vec![MpvOp::LoadPaused(url)]
            }
            AudioCommand::Clear => {
                self.playing = false;
                match self.source.take() {
                    Some(_) => vec![MpvOp::Stop],
                    None => Vec::new(),
                }
            }
            AudioCommand::Play | AudioCommand::Resume => {
                if self.source.is_none() || self.playing {
                    return Vec::new();
                }
                self.playing = true;
                vec![MpvOp::SetPause(false)]
            }
            AudioCommand::Pause => {
                if !self.playing {
                    return Vec::new();
                }
                self.playing = false;
                vec![MpvOp::SetPause(true)]
            }
        }
    }
}

/// [`AudioSink`] that hands every call to the audio task.
pub struct ChannelAudioSink {
    tx: mpsc::UnboundedSender<AudioCommand>,
}

impl ChannelAudioSink {
    pub fn new(tx: mpsc::UnboundedSender<AudioCommand>) -> Self {
        Self { tx }
    }

    fn send(&self, cmd: AudioCommand) {
        if self.tx.send(cmd).is_err() {
            warn!("audio: player task gone, command dropped");
        }
    }
}

impl AudioSink for ChannelAudioSink {
    fn set_source(&mut self, url: &str) {
        self.send(AudioCommand::SetSource(url.to_string()));
    }

    fn clear(&mut self) {
        self.send(AudioCommand::Clear);
    }

    fn play(&mut self) {
        self.send(AudioCommand::Play);
    }

    fn pause(&mut self) {
        self.send(AudioCommand::Pause);
    }

    fn resume(&mut self) {
        self.send(AudioCommand::Resume);
    }
}

/// Run the player until every sink is dropped.  mpv is spawned on the first
/// track and respawned if it dies; without mpv the viewer stays silent.
pub fn spawn_player(mut rx: mpsc::UnboundedReceiver<AudioCommand>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut driver = MpvDriver::new();
        let mut handle: Option<MpvHandle> = None;
        let mut state = PlayerState::default();
        let mut unavailable = false;

        while let Some(cmd) = rx.recv().await {
            debug!("audio: {:?}", cmd);
            for op in state.apply(cmd) {
                if handle.is_some() && !driver.process_alive() {
                    handle = None;
                }
                if handle.is_none() {
                    if unavailable || op == MpvOp::Stop {
                        continue;
                    }
                    match driver.spawn_and_connect().await {
                        Ok(h) => handle = Some(h),
                        Err(e) => {
                            warn!("audio: mpv unavailable, playing silently: {}", e);
                            unavailable = true;
                            continue;
                        }
                    }
                }
                let Some(h) = handle.as_ref() else {
                    continue;
                };
                let result = match &op {
                    MpvOp::LoadPaused(url) => h.load_paused(url).await,
                    MpvOp::SetPause(paused) => h.set_pause(*paused).await,
                    MpvOp::Stop => h.stop().await,
                };
                if let Err(e) = result {
                    warn!("audio: {:?} failed: {}", op, e);
                }
            }
        }

        info!("audio: player shutting down");
        driver.kill().await;
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resume_without_source_does_nothing() {
        let mut state = PlayerState::default();
        assert!(state.apply(AudioCommand::Resume).is_empty());
        assert!(state.apply(AudioCommand::Play).is_empty());
        assert!(!state.is_playing());
    }

    #[test]
    fn new_source_loads_paused_until_played() {
        let mut state = PlayerState::default();
        assert_eq!(
            state.apply(AudioCommand::SetSource("https://cdn/a".into())),
            vec![MpvOp::LoadPaused("https://cdn/a".into())]
        );
        assert!(!state.is_playing());
        assert_eq!(state.apply(AudioCommand::Play), vec![MpvOp::SetPause(false)]);
        assert!(state.apply(AudioCommand::Play).is_empty());
    }

    #[test]
    fn pause_and_resume_round_trip() {
        let mut state = PlayerState::default();
        state.apply(AudioCommand::SetSource("https://cdn/a".into()));
        state.apply(AudioCommand::Play);
        assert_eq!(state.apply(AudioCommand::Pause), vec![MpvOp::SetPause(true)]);
        assert_eq!(state.apply(AudioCommand::Resume), vec![MpvOp::SetPause(false)]);
        assert!(state.is_playing());
    }

    #[test]
    fn clear_stops_and_forgets_source() {
        let mut state = PlayerState::default();
        state.apply(AudioCommand::SetSource("https://cdn/a".into()));
        state.apply(AudioCommand::Play);
        assert_eq!(state.apply(AudioCommand::Clear), vec![MpvOp::Stop]);
        assert_eq!(state.source(), None);
        assert!(state.apply(AudioCommand::Clear).is_empty());
        assert!(state.apply(AudioCommand::Resume).is_empty());
    }

    #[test]
    fn sink_forwards_commands() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut sink = ChannelAudioSink::new(tx);
        sink.set_source("https://cdn/a");
        sink.play();
        sink.clear();
        assert_eq!(rx.try_recv().unwrap(), AudioCommand::SetSource("https://cdn/a".into()));
        assert_eq!(rx.try_recv().unwrap(), AudioCommand::Play);
        assert_eq!(rx.try_recv().unwrap(), AudioCommand::Clear);
    }
}
