use log::{debug, error, info, warn};

use crate::dispatch::Dispatcher;
use crate::error::PlaybackError;
use crate::events::PanelEvent;
use crate::playback::pipeline::{MediaPipeline, PipelineEvent, PipelineMessage, PipelineState};
use crate::playback::playlist::PlaylistResolver;
use crate::playback::types::{BufferSettings, PlaybackState, TrackMetadata};

/// A `set_source` call whose playlist reference still has to be resolved. Resolving needs no
/// access to the controller, so it can run on the runtime while the UI keeps going.
#[derive(Debug, Clone)]
pub struct SourceRequest {
    request: u64,
    uri: String,
    resolver: PlaylistResolver,
}

impl SourceRequest {
    pub async fn resolve(self) -> ResolvedSource {
        let uri = self.resolver.resolve(&self.uri).await;
        ResolvedSource { request: self.request, uri }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSource {
    pub request: u64,
    pub uri: String,
}

/// Drives the media pipeline and interprets its bus messages.
///
/// The controller lives on the UI thread. Bus messages reach it through the dispatcher as
/// [`PanelEvent::Pipeline`] and are fed to [`PlaybackController::handle_message`].
pub struct PlaybackController<P: MediaPipeline> {
    pipeline: P,
    state: PlaybackState,
    buffer: BufferSettings,
    resolver: PlaylistResolver,
    dispatcher: Dispatcher<PanelEvent>,
    current_uri: Option<String>,
    metadata: Option<TrackMetadata>,
    volume: f64,
    // id of the newest source request, older resolutions are dropped
    request: u64,
}

impl<P: MediaPipeline> PlaybackController<P> {
    pub fn new(pipeline: P, buffer: BufferSettings, dispatcher: Dispatcher<PanelEvent>) -> Self {
        PlaybackController {
            pipeline,
            state: PlaybackState::Idle,
            buffer,
            resolver: PlaylistResolver::new(),
            dispatcher,
            current_uri: None,
            metadata: None,
            volume: 1.0,
            request: 0,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn current_uri(&self) -> Option<&str> {
        self.current_uri.as_deref()
    }

    pub fn metadata(&self) -> Option<&TrackMetadata> {
        self.metadata.as_ref()
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub fn resolver(&self) -> &PlaylistResolver {
        &self.resolver
    }

    fn transition(&mut self, new_state: PlaybackState) {
        if self.state == new_state {
            return;
        }

        debug!("Playback {} -> {}", self.state, new_state);
        self.state = new_state;
        self.dispatcher.post(PanelEvent::PlaybackState(new_state));
    }

    /// Resolves playlist references in `uri` and starts playing the result.
    pub async fn set_source(&mut self, uri: &str) -> Result<(), PlaybackError> {
        let resolved = self.request_source(uri).resolve().await;
        self.apply_source(resolved)
    }

    /// First half of `set_source`. Every request supersedes the ones before it.
    pub fn request_source(&mut self, uri: &str) -> SourceRequest {
        self.request = self.request.wrapping_add(1);

        SourceRequest {
            request: self.request,
            uri: uri.to_string(),
            resolver: self.resolver.clone(),
        }
    }

    /// Second half of `set_source`. A resolution that was superseded while it was fetched is
    /// dropped, so the newest request always wins.
    pub fn apply_source(&mut self, resolved: ResolvedSource) -> Result<(), PlaybackError> {
        if resolved.request != self.request {
            debug!("Dropping superseded source {}", resolved.uri);
            return Ok(());
        }

        self.load(&resolved.uri)
    }

    /// Plays `uri`, which must already be resolved.
    ///
    /// The pipeline is always brought down to NULL first so the previous stream is stopped
    /// before the new one is configured.
    pub fn load(&mut self, uri: &str) -> Result<(), PlaybackError> {
        info!("Loading uri {}", uri);
        // pending resolutions must not replace this uri
        self.request = self.request.wrapping_add(1);

        if let Err(err) = self.pipeline.set_state(PipelineState::Null) {
            warn!("Failed to reset pipeline: {}", err);
        }
        self.transition(PlaybackState::Idle);
        self.metadata = None;

        self.transition(PlaybackState::Loading);
        self.current_uri = Some(uri.to_string());
        self.pipeline.set_uri(uri);
        self.pipeline.set_buffering(&self.buffer);
        self.pipeline.set_volume(self.volume);

        match self.pipeline.set_state(PipelineState::Playing) {
            Ok(()) => Ok(()),
            Err(err) => {
                error!("{}", err);
                self.transition(PlaybackState::Error);
                Err(err)
            },
        }
    }

    /// Stops playback and releases the stream.
    pub fn stop(&mut self) {
        self.request = self.request.wrapping_add(1);
        if let Err(err) = self.pipeline.set_state(PipelineState::Null) {
            warn!("Failed to stop pipeline: {}", err);
        }
        self.current_uri = None;
        self.metadata = None;
        self.transition(PlaybackState::Idle);
    }

    /// `volume` is expected in [0.0, 1.0]; values outside are clamped.
    pub fn set_volume(&mut self, volume: f64) {
        let clamped = if volume.is_nan() { 0.0 } else { volume.clamp(0.0, 1.0) };
        if clamped != volume {
            debug!("Volume {} clamped to {}", volume, clamped);
        }

        self.volume = clamped;
        self.pipeline.set_volume(clamped);
    }

    /// Handles a message forwarded from the pipeline bus, unless it belongs to a stream that
    /// was replaced since.
    pub fn handle_event(&mut self, event: PipelineEvent) {
        if event.generation != self.pipeline.generation() {
            debug!("Dropping {:?} from a previous stream", event.message);
            return;
        }

        self.handle_message(event.message);
    }

    pub fn handle_message(&mut self, message: PipelineMessage) {
        match message {
            PipelineMessage::Error { message, debug } => {
                error!("Pipeline error: {}", message);
                error!("Debug info: {}", debug.as_deref().unwrap_or("none"));
                self.transition(PlaybackState::Error);
            },
            PipelineMessage::StateChanged { top_level: false, .. } => {},
            PipelineMessage::StateChanged { top_level: true, old, new } => {
                info!("Pipeline state: {} -> {}", old.name(), new.name());

                if new == PipelineState::Playing && self.state == PlaybackState::Loading {
                    self.transition(PlaybackState::Playing);
                }
            },
            PipelineMessage::Buffering(percent) => {
                debug!("Buffering: {}%", percent);
                self.dispatcher.post(PanelEvent::Buffering(percent));

                match self.state {
                    PlaybackState::Playing if percent < 100 => self.transition(PlaybackState::Buffering),
                    PlaybackState::Buffering if percent >= 100 => self.transition(PlaybackState::Playing),
                    _ => {},
                }
            },
            PipelineMessage::Tag { title, artist } => {
                let metadata = TrackMetadata { artist, title };
                if metadata.is_empty() {
                    return;
                }

                info!("Now playing: {}", metadata.display());
                self.metadata = Some(metadata.clone());
                self.dispatcher.post(PanelEvent::Track(metadata));
            },
            PipelineMessage::EndOfStream => {
                info!("End of stream");
                self.stop();
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{dispatch_channel, DispatchQueue};

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        SetState(PipelineState),
        SetUri(String),
        SetBuffering(BufferSettings),
        SetVolume(f64),
    }

    #[derive(Default)]
    struct FakePipeline {
        calls: Vec<Call>,
        state: Option<PipelineState>,
        reject_playing: bool,
        generation: u64,
    }

    impl MediaPipeline for FakePipeline {
        fn set_state(&mut self, state: PipelineState) -> Result<(), PlaybackError> {
            self.calls.push(Call::SetState(state));
            if state == PipelineState::Playing {
                assert_ne!(self.state, Some(PipelineState::Playing), "previous stream still playing");
                if self.reject_playing {
                    return Err(PlaybackError::PipelineStateFailure {
                        target: state.name(),
                        reason: "rejected".to_string(),
                    });
                }
            }
            if state == PipelineState::Null {
                self.generation += 1;
            }
            self.state = Some(state);
            Ok(())
        }

        fn set_uri(&mut self, uri: &str) {
            assert!(matches!(self.state, None | Some(PipelineState::Null)), "uri changed while running");
            self.calls.push(Call::SetUri(uri.to_string()));
        }

        fn set_buffering(&mut self, settings: &BufferSettings) {
            self.calls.push(Call::SetBuffering(*settings));
        }

        fn set_volume(&mut self, volume: f64) {
            self.calls.push(Call::SetVolume(volume));
        }

        fn generation(&self) -> u64 {
            self.generation
        }
    }

    const BUFFER: BufferSettings = BufferSettings { duration_ms: 5000, size_bytes: 1024 * 1024 };

    fn controller(pipeline: FakePipeline) -> (PlaybackController<FakePipeline>, DispatchQueue<PanelEvent>) {
        let (dispatcher, queue) = dispatch_channel();
        (PlaybackController::new(pipeline, BUFFER, dispatcher), queue)
    }

    fn drain(queue: &mut DispatchQueue<PanelEvent>) -> Vec<PanelEvent> {
        let mut events = Vec::new();
        queue.run_pending(|event| events.push(event));
        events
    }

    fn playing_changed() -> PipelineMessage {
        PipelineMessage::StateChanged { top_level: true, old: PipelineState::Paused, new: PipelineState::Playing }
    }

    #[test]
    fn load_configures_pipeline_before_playing() {
        let (mut controller, mut queue) = controller(FakePipeline::default());

        controller.load("http://x/stream.mp3").unwrap();

        assert_eq!(controller.pipeline().calls, vec![
            Call::SetState(PipelineState::Null),
            Call::SetUri("http://x/stream.mp3".to_string()),
            Call::SetBuffering(BUFFER),
            Call::SetVolume(1.0),
            Call::SetState(PipelineState::Playing),
        ]);
        assert_eq!(controller.state(), PlaybackState::Loading);
        assert_eq!(drain(&mut queue), vec![PanelEvent::PlaybackState(PlaybackState::Loading)]);

        controller.handle_message(playing_changed());
        assert_eq!(controller.state(), PlaybackState::Playing);
    }

    #[test]
    fn new_source_while_playing_resets_first() {
        let (mut controller, mut queue) = controller(FakePipeline::default());
        controller.load("http://x/first.mp3").unwrap();
        controller.handle_message(playing_changed());
        drain(&mut queue);

        controller.load("http://x/second.mp3").unwrap();

        let calls = &controller.pipeline().calls;
        let second = &calls[calls.len() - 5..];
        assert_eq!(second[0], Call::SetState(PipelineState::Null));
        assert_eq!(second[1], Call::SetUri("http://x/second.mp3".to_string()));
        assert_eq!(second[4], Call::SetState(PipelineState::Playing));

        assert_eq!(drain(&mut queue), vec![
            PanelEvent::PlaybackState(PlaybackState::Idle),
            PanelEvent::PlaybackState(PlaybackState::Loading),
        ]);
        assert_eq!(controller.current_uri(), Some("http://x/second.mp3"));
    }

    #[test]
    fn rejected_transition_moves_to_error_and_can_recover() {
        let (mut controller, _queue) = controller(FakePipeline { reject_playing: true, ..Default::default() });

        assert!(matches!(
            controller.load("http://x/stream.mp3"),
            Err(PlaybackError::PipelineStateFailure { .. })
        ));
        assert_eq!(controller.state(), PlaybackState::Error);

        controller.pipeline.reject_playing = false;
        controller.load("http://x/stream.mp3").unwrap();
        assert_eq!(controller.state(), PlaybackState::Loading);
    }

    #[test]
    fn pipeline_error_moves_to_error() {
        let (mut controller, _queue) = controller(FakePipeline::default());
        controller.load("http://x/stream.mp3").unwrap();
        controller.handle_message(playing_changed());

        controller.handle_message(PipelineMessage::Error {
            message: "Could not resolve server name".to_string(),
            debug: None,
        });

        assert_eq!(controller.state(), PlaybackState::Error);
    }

    #[test]
    fn child_state_changes_are_ignored() {
        let (mut controller, _queue) = controller(FakePipeline::default());
        controller.load("http://x/stream.mp3").unwrap();

        controller.handle_message(PipelineMessage::StateChanged {
            top_level: false,
            old: PipelineState::Paused,
            new: PipelineState::Playing,
        });

        assert_eq!(controller.state(), PlaybackState::Loading);
    }

    #[test]
    fn buffering_toggles_between_playing_and_buffering() {
        let (mut controller, mut queue) = controller(FakePipeline::default());
        controller.load("http://x/stream.mp3").unwrap();
        controller.handle_message(playing_changed());
        drain(&mut queue);

        controller.handle_message(PipelineMessage::Buffering(40));
        assert_eq!(controller.state(), PlaybackState::Buffering);
        controller.handle_message(PipelineMessage::Buffering(100));
        assert_eq!(controller.state(), PlaybackState::Playing);

        assert_eq!(drain(&mut queue), vec![
            PanelEvent::Buffering(40),
            PanelEvent::PlaybackState(PlaybackState::Buffering),
            PanelEvent::Buffering(100),
            PanelEvent::PlaybackState(PlaybackState::Playing),
        ]);
    }

    #[test]
    fn tags_are_posted_as_track_metadata() {
        let (mut controller, mut queue) = controller(FakePipeline::default());

        controller.handle_message(PipelineMessage::Tag { title: Some("Song".into()), artist: Some("Band".into()) });
        controller.handle_message(PipelineMessage::Tag { title: None, artist: None });

        let expected = TrackMetadata { artist: Some("Band".into()), title: Some("Song".into()) };
        assert_eq!(drain(&mut queue), vec![PanelEvent::Track(expected.clone())]);
        assert_eq!(controller.metadata(), Some(&expected));
    }

    #[test]
    fn volume_is_clamped() {
        let (mut controller, _queue) = controller(FakePipeline::default());

        controller.set_volume(1.5);
        assert_eq!(controller.volume(), 1.0);
        controller.set_volume(-0.2);
        assert_eq!(controller.volume(), 0.0);
        controller.set_volume(0.45);
        assert_eq!(controller.volume(), 0.45);

        assert_eq!(controller.pipeline().calls, vec![
            Call::SetVolume(1.0),
            Call::SetVolume(0.0),
            Call::SetVolume(0.45),
        ]);
    }

    #[tokio::test]
    async fn set_source_plays_direct_uri() {
        let (mut controller, _queue) = controller(FakePipeline::default());

        controller.set_source("http://x/stream.mp3").await.unwrap();

        assert_eq!(controller.current_uri(), Some("http://x/stream.mp3"));
        assert_eq!(controller.state(), PlaybackState::Loading);
    }

    #[tokio::test]
    async fn newest_source_wins_over_slower_resolution() {
        let (mut controller, _queue) = controller(FakePipeline::default());

        let older = controller.request_source("http://x/older.mp3");
        let newer = controller.request_source("http://x/direct.mp3");

        let older = older.resolve().await;
        let newer = newer.resolve().await;

        // the newer request finishes first, the older one (a slow playlist fetch) afterwards
        controller.apply_source(newer).unwrap();
        controller.apply_source(older).unwrap();

        assert_eq!(controller.current_uri(), Some("http://x/direct.mp3"));
        let uris: Vec<_> = controller.pipeline().calls.iter()
            .filter(|call| matches!(call, Call::SetUri(_)))
            .collect();
        assert_eq!(uris, vec![&Call::SetUri("http://x/direct.mp3".to_string())]);
    }

    #[tokio::test]
    async fn direct_load_supersedes_pending_request() {
        let (mut controller, _queue) = controller(FakePipeline::default());

        let pending = controller.request_source("http://x/old.mp3");
        controller.load("http://x/new.mp3").unwrap();
        controller.apply_source(pending.resolve().await).unwrap();

        assert_eq!(controller.current_uri(), Some("http://x/new.mp3"));
    }

    #[test]
    fn messages_from_a_replaced_stream_are_dropped() {
        let (mut controller, mut queue) = controller(FakePipeline::default());
        controller.load("http://x/first.mp3").unwrap();
        let first = controller.pipeline().generation();
        controller.handle_event(PipelineEvent { generation: first, message: playing_changed() });
        assert_eq!(controller.state(), PlaybackState::Playing);

        controller.load("http://x/second.mp3").unwrap();
        drain(&mut queue);

        // still queued from the first stream
        controller.handle_event(PipelineEvent {
            generation: first,
            message: PipelineMessage::Tag { title: Some("Old song".into()), artist: None },
        });
        controller.handle_event(PipelineEvent { generation: first, message: playing_changed() });

        assert_eq!(controller.metadata(), None);
        assert_eq!(controller.state(), PlaybackState::Loading);
        assert!(drain(&mut queue).is_empty());

        let second = controller.pipeline().generation();
        controller.handle_event(PipelineEvent {
            generation: second,
            message: PipelineMessage::Tag { title: Some("New song".into()), artist: None },
        });
        assert_eq!(controller.metadata().and_then(|metadata| metadata.title.as_deref()), Some("New song"));
    }

    #[tokio::test]
    async fn stop_cancels_pending_request() {
        let (mut controller, _queue) = controller(FakePipeline::default());

        let pending = controller.request_source("http://x/stream.mp3");
        controller.stop();
        controller.apply_source(pending.resolve().await).unwrap();

        assert_eq!(controller.current_uri(), None);
        assert_eq!(controller.state(), PlaybackState::Idle);
    }
}
