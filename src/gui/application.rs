use std::path::PathBuf;
use iced::{Alignment, Application, Command, Element, Length, Settings, Size, Subscription, window};
use iced::event::{self, Event};
use iced::time::{every as iced_time_every};
use iced::theme::{self, Theme};
use iced::widget::{
    Column, button, column, container, horizontal_rule, row, scrollable, slider, text, text_input,
};
use std::time::{Duration};
use log::{error, info, warn};
use tokio_util::sync::{CancellationToken};

use crate::config::io::{ConfigIO};
use crate::config::types::PanelConfig;
use crate::discovery::client::DiscoveryClient;
use crate::dispatch::{dispatch_channel, dispatch_subscription, shared_queue, Dispatcher, SharedDispatchQueue};
use crate::encoder::decoder::RotaryEncoder;
use crate::error::AppRunError;
use crate::events::PanelEvent;
use crate::gui::devices::{DeviceEntry, DeviceList, PairingState};
use crate::gui::executor::MyExecutor;
use crate::gui::style::DeviceButtonStyleSheet;
use crate::gui::types::Message;
use crate::gui::volume::VolumeKnob;
use crate::playback::constants::STREAM_RUNNING_PLACEHOLDER;
use crate::playback::controller::PlaybackController;
use crate::playback::default_pipeline;
use crate::playback::pipeline::MediaPipeline;
use crate::playback::types::PlaybackState;
use crate::position::poller::PositionPoller;
use crate::position::types::PositionFix;

/// Which peripherals to bring up once the config is loaded.
#[derive(Debug, Clone, Copy)]
pub struct StartupOptions {
    pub gps: bool,
    pub encoder: bool,
    pub bluetooth: bool,
}

impl Default for StartupOptions {
    fn default() -> Self {
        StartupOptions { gps: true, encoder: true, bluetooth: true }
    }
}

pub struct ApplicationFlags {
    config_io: ConfigIO,
    options: StartupOptions,
}

pub struct PanelApplication {
    // this token is cancelled upon exit
    app_cancel: CancellationToken,

    // messages that the user must click away
    notices: Vec<String>,

    config_io: ConfigIO,
    config: PanelConfig,
    options: StartupOptions,

    // every peripheral posts into this dispatcher, the subscription drains the queue
    dispatcher: Dispatcher<PanelEvent>,
    queue: SharedDispatchQueue<PanelEvent>,

    poller: Option<PositionPoller>,
    position: PositionFix,
    encoder: Option<RotaryEncoder>,
    discovery: Option<DiscoveryClient>,
    devices: DeviceList,
    playback: Option<PlaybackController<Box<dyn MediaPipeline>>>,

    playback_state: PlaybackState,
    track_line: String,
    buffering: Option<i32>,
    volume: VolumeKnob,
    station: String,
}

impl PanelApplication {
    fn before_close(&mut self) {
        self.app_cancel.cancel();

        if let Some(playback) = self.playback.as_mut() {
            playback.stop();
        }
        if let Some(mut poller) = self.poller.take() {
            poller.stop();
        }
        if let Some(mut encoder) = self.encoder.take() {
            encoder.stop();
        }
    }

    fn load_config(&self) -> Command<Message> {
        let config_io = self.config_io.clone();

        let fut = async move {
            match config_io.read().await {
                Ok(config) => (config, None),
                Err(err) => {
                    let mut error_message: Option<String> = None;

                    if err.is_file_not_found_error() {
                        info!("Config file not found, using defaults");
                    } else {
                        error!("Failed to load config: {:?}", &err);
                        error_message = Some(format!("Failed to load config: {}", &err));
                    }
                    (PanelConfig::default(), error_message)
                }
            }
        };

        Command::perform(fut, Message::ConfigLoadComplete)
    }

    /// Brings up every enabled peripheral. The bluetooth client connects in the background and
    /// arrives as `Message::DiscoveryReady`.
    fn start_peripherals(&mut self) -> Command<Message> {
        let config = self.config.clone();

        let mut playback = PlaybackController::new(
            default_pipeline(self.dispatcher.clone(), self.app_cancel.clone()),
            config.playback.buffer(),
            self.dispatcher.clone(),
        );
        playback.set_volume(config.playback.initial_volume);
        self.volume = VolumeKnob::from_level(playback.volume(), config.volume_step);
        self.playback = Some(playback);

        if self.options.gps {
            let mut poller = PositionPoller::new(&config.gpsd.host, config.gpsd.port, self.app_cancel.clone());
            match poller.start() {
                Ok(()) => self.poller = Some(poller),
                Err(err) => error!("Failed to start position poller: {}", err),
            }
        }

        if self.options.encoder {
            match RotaryEncoder::start(config.encoder.clone(), self.dispatcher.clone(), self.app_cancel.clone()) {
                Ok(encoder) => self.encoder = Some(encoder),
                Err(err) => error!("Failed to start rotary encoder: {}", err),
            }
        }

        if !self.options.bluetooth {
            return Command::none();
        }

        let adapter = config.bluetooth.adapter;
        let dispatcher = self.dispatcher.clone();
        let cancel = self.app_cancel.clone();
        let fut = async move {
            DiscoveryClient::connect(&adapter, dispatcher, cancel).await
        };

        Command::perform(fut, Message::DiscoveryReady)
    }

    fn play(&mut self) -> Command<Message> {
        let uri = self.station.trim().to_string();
        if uri.is_empty() {
            return Command::none();
        }

        let request = match self.playback.as_mut() {
            Some(playback) => playback.request_source(&uri),
            None => {
                warn!("Playback is not ready yet");
                return Command::none();
            },
        };

        Command::perform(request.resolve(), Message::SourceResolved)
    }

    fn apply_volume(&mut self) {
        if let Some(playback) = self.playback.as_mut() {
            playback.set_volume(self.volume.level());
        }
    }

    fn handle_panel_event(&mut self, event: PanelEvent) {
        match event {
            PanelEvent::DeviceDiscovered(device) => {
                if self.devices.upsert(device) {
                    info!("{} devices discovered", self.devices.len());
                }
            },
            PanelEvent::PairingFinished { address, success } => {
                self.devices.pairing_finished(&address, success);
            },
            PanelEvent::Track(metadata) => {
                self.track_line = metadata.display();
            },
            PanelEvent::PlaybackState(state) => {
                self.playback_state = state;

                match state {
                    PlaybackState::Idle | PlaybackState::Loading => {
                        self.track_line.clear();
                        self.buffering = None;
                    },
                    PlaybackState::Playing if self.track_line.is_empty() => {
                        self.track_line = STREAM_RUNNING_PLACEHOLDER.to_string();
                    },
                    _ => {},
                }
            },
            PanelEvent::Buffering(percent) => {
                self.buffering = if percent < 100 { Some(percent) } else { None };
            },
            PanelEvent::Pipeline(event) => {
                if let Some(playback) = self.playback.as_mut() {
                    playback.handle_event(event);
                }
            },
            PanelEvent::Encoder(tick) => {
                self.volume.turn(tick.direction);
                self.apply_volume();
            },
        }
    }

    fn device_row(&self, entry: &DeviceEntry) -> Element<Message> {
        let device = &entry.device;

        let status = match (entry.pairing, device.paired, device.connected) {
            (PairingState::Pairing, _, _) => "Pairing…",
            (PairingState::Failed, _, _) => "Pairing failed",
            (_, _, true) => "Connected",
            (_, true, false) => "Paired",
            _ => "",
        };

        let mut device_button = button(
            row![
                column![
                    text(&device.display_name),
                    text(&device.address).size(12),
                ].width(Length::Fill),
                text(status).size(14),
            ].align_items(Alignment::Center).spacing(10)
        )
        .width(Length::Fill)
        .style(theme::Button::Custom(Box::new(DeviceButtonStyleSheet { paired: device.paired })));

        let can_pair = !device.paired && entry.pairing != PairingState::Pairing;
        if can_pair && self.discovery.as_ref().map(DiscoveryClient::is_enabled).unwrap_or(false) {
            device_button = device_button.on_press(Message::Pair(device.address.clone()));
        }

        device_button.into()
    }
}

impl Application for PanelApplication {
    type Executor = MyExecutor;
    type Message = Message;
    type Theme = Theme;
    type Flags = ApplicationFlags;

    fn new(flags: ApplicationFlags) -> (PanelApplication, Command<Self::Message>) {
        let (dispatcher, queue) = dispatch_channel();
        let config = PanelConfig::default();
        let volume = VolumeKnob::from_level(config.playback.initial_volume, config.volume_step);

        let app = PanelApplication {
            app_cancel: CancellationToken::new(),
            notices: Vec::new(),
            config_io: flags.config_io,
            config,
            options: flags.options,
            dispatcher,
            queue: shared_queue(queue),
            poller: None,
            position: PositionFix::default(),
            encoder: None,
            discovery: None,
            devices: DeviceList::default(),
            playback: None,
            playback_state: PlaybackState::Idle,
            track_line: String::new(),
            buffering: None,
            volume,
            station: String::new(),
        };

        let command = app.load_config();
        (app, command)
    }

    fn title(&self) -> String {
        String::from(concat!("Car Panel ", env!("CARGO_PKG_VERSION")))
    }

    fn update(&mut self, message: Message) -> Command<Self::Message> {
        match message {
            Message::ConfigLoadComplete((config, error_message)) => {
                info!("Config load complete");
                self.config = config;
                if let Some(error_message) = error_message {
                    self.notices.push(error_message);
                }
                return self.start_peripherals();
            },
            Message::NoticeConfirmed => {
                if !self.notices.is_empty() {
                    self.notices.remove(0);
                }
            },
            Message::EventOccurred(Event::Window(id, window::Event::CloseRequested)) => {
                info!("Close requested");
                self.before_close();
                return window::close(id);
            },
            Message::Panel(event) => {
                self.handle_panel_event(event);
            },
            Message::PositionTick => {
                if let Some(poller) = &self.poller {
                    self.position = poller.latest();
                }
            },
            Message::DiscoveryReady(client) => {
                if !client.is_enabled() {
                    self.notices.push("Bluetooth is not available".to_string());
                }
                self.discovery = Some(client);
            },
            Message::StartDiscovery => {
                if let Some(client) = &self.discovery {
                    // the call finishes in the background, errors are logged there
                    let _ = client.start_discovery();
                }
            },
            Message::Pair(address) => {
                if let Some(client) = &self.discovery {
                    if client.pair(&address).is_some() {
                        self.devices.pairing_started(&address);
                    }
                }
            },
            Message::StationInput(value) => {
                self.station = value;
            },
            Message::Play => {
                return self.play();
            },
            Message::SourceResolved(resolved) => {
                if let Some(playback) = self.playback.as_mut() {
                    let uri = resolved.uri.clone();
                    if let Err(err) = playback.apply_source(resolved) {
                        self.notices.push(format!("Failed to play {}: {}", uri, err));
                    }
                }
            },
            Message::Stop => {
                if let Some(playback) = self.playback.as_mut() {
                    playback.stop();
                }
            },
            Message::VolumeChanged(percent) => {
                self.volume.set_percent(percent);
                self.apply_volume();
            },

            _ => {}
        }

        Command::none()
    }

    fn subscription(&self) -> Subscription<Message> {
        Subscription::batch([
            event::listen().map(Message::EventOccurred),
            iced_time_every(Duration::from_secs(1)).map(|_| Message::PositionTick),
            dispatch_subscription(self.queue.clone()).map(Message::Panel),
        ])
    }

    fn view(&self) -> Element<Message> {
        if let Some(notice) = self.notices.first() {
            return container(
                column![
                    text(notice),

                    button(text("Okay"))
                        .on_press(Message::NoticeConfirmed),

                ].align_items(Alignment::Center).spacing(20),
            )
            .width(Length::Fill)
            .padding(20)
            .into()
        }

        let status_line = match self.buffering {
            Some(percent) => format!("{} ({}%)", self.playback_state, percent),
            None => self.playback_state.to_string(),
        };

        let station_form = row![
            text_input("Station or playlist URL", &self.station)
                .on_input(Message::StationInput)
                .on_submit(Message::Play)
                .width(Length::Fill),
            button(text("Play")).on_press(Message::Play),
            button(text("Stop")).style(theme::Button::Secondary).on_press(Message::Stop),
        ]
        .align_items(Alignment::Center)
        .spacing(10);

        let volume_form = row![
            text(format!("Volume {}%", self.volume.percent())).width(110),
            slider(0..=100, self.volume.percent(), Message::VolumeChanged),
        ]
        .align_items(Alignment::Center)
        .spacing(10);

        let position = column![
            text(self.position.speed_text()).size(32),
            text(self.position.detail_text()).size(14),
        ]
        .spacing(4);

        let mut scan_button = button(text("Scan for devices"));
        if self.discovery.as_ref().map(DiscoveryClient::is_enabled).unwrap_or(false) {
            scan_button = scan_button.on_press(Message::StartDiscovery);
        }

        let device_list = Column::with_children(
            self.devices
                .iter()
                .map(|entry| self.device_row(entry))
        )
        .spacing(6);

        container(
            column![
                text(&self.track_line).size(24),
                text(status_line).size(14),
                station_form,
                volume_form,

                horizontal_rule(10),

                position,

                horizontal_rule(10),

                scrollable(device_list).height(Length::Fill),
                scan_button,
            ]
            .spacing(16)
            .width(Length::Fill)
            .height(Length::Fill),
        )
        .width(Length::Fill)
        .padding(20)
        .into()
    }
}

pub fn run_application(config_path: Option<PathBuf>, options: StartupOptions) -> Result<(), AppRunError> {
    let config_io = ConfigIO::new_sync(config_path)?;
    let mut config_locker = config_io.locker()?;
    let _lock_guard = config_locker.lock()?;

    let flags = ApplicationFlags { config_io, options };
    let mut settings = Settings::with_flags(flags);

    // handle exits ourselves (Event::CloseRequested)
    settings.id = Some("car-panel".to_string());
    settings.window.exit_on_close_request = false;
    settings.window.size = Size::new(1024.0, 600.0);
    settings.window.resizable = false;
    settings.window.decorations = false;

    // this function will call process::exit() unless there was a startup error
    PanelApplication::run(settings)?;
    Ok(())
}
