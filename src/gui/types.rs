use iced::{Event};

use crate::config::types::PanelConfig;
use crate::discovery::client::DiscoveryClient;
use crate::events::PanelEvent;
use crate::playback::controller::ResolvedSource;

#[derive(Debug, Clone)]
pub enum Message {
    EventOccurred(Event),
    ConfigLoadComplete((PanelConfig, Option<String>)),
    NoticeConfirmed,
    Panel(PanelEvent),
    PositionTick,
    DiscoveryReady(DiscoveryClient),
    StartDiscovery,
    Pair(String),
    StationInput(String),
    Play,
    SourceResolved(ResolvedSource),
    Stop,
    VolumeChanged(u8),
}
