/// Lifecycle notifications emitted by the playback engine.
///
/// Events are non-cancelable and carry no payload; the engine's state at
/// emission time is the payload. Operations on [`crate::Player`] return the
/// events they emitted, in order, for the host to dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerEvent {
    LoadStart,
    Abort,
    Emptied,
    Error,
    DurationChange,
    Resize,
    LoadedMetadata,
    Progress,
    Suspend,
    LoadedData,
    CanPlay,
    CanPlayThrough,
    Play,
    Pause,
    TimeUpdate,
    RateChange,
    Ended,
    TitleChange,
}

impl PlayerEvent {
    /// The event's wire name, matching the HTML media event vocabulary.
    pub fn name(self) -> &'static str {
        match self {
            Self::LoadStart => "loadstart",
            Self::Abort => "abort",
            Self::Emptied => "emptied",
            Self::Error => "error",
            Self::DurationChange => "durationchange",
            Self::Resize => "resize",
            Self::LoadedMetadata => "loadedmetadata",
            Self::Progress => "progress",
            Self::Suspend => "suspend",
            Self::LoadedData => "loadeddata",
            Self::CanPlay => "canplay",
            Self::CanPlayThrough => "canplaythrough",
            Self::Play => "play",
            Self::Pause => "pause",
            Self::TimeUpdate => "timeupdate",
            Self::RateChange => "ratechange",
            Self::Ended => "ended",
            Self::TitleChange => "titlechange",
        }
    }
}

/// Media error taxonomy, numbered like `MediaError.code`.
///
/// The engine itself only ever raises [`MediaErrorCode::SrcNotSupported`];
/// the remaining codes exist so hosts can surface their own conditions
/// through the same channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum MediaErrorCode {
    Aborted,
    Network,
    Decode,
    SrcNotSupported,
}

impl MediaErrorCode {
    pub fn code(self) -> u16 {
        match self {
            Self::Aborted => 1,
            Self::Network => 2,
            Self::Decode => 3,
            Self::SrcNotSupported => 4,
        }
    }

    pub fn const_name(self) -> &'static str {
        match self {
            Self::Aborted => "MEDIA_ERR_ABORTED",
            Self::Network => "MEDIA_ERR_NETWORK",
            Self::Decode => "MEDIA_ERR_DECODE",
            Self::SrcNotSupported => "MEDIA_ERR_SRC_NOT_SUPPORTED",
        }
    }

    pub fn explanation(self) -> &'static str {
        match self {
            Self::Aborted => {
                "The fetching process for the media resource was aborted at the user's request."
            }
            Self::Network => {
                "A network error caused fetching of the media resource to stop after it was established to be usable."
            }
            Self::Decode => {
                "An error occurred while decoding the media resource after it was established to be usable."
            }
            Self::SrcNotSupported => {
                "The media resource indicated by the src attribute was not suitable."
            }
        }
    }
}
