#![forbid(unsafe_code)]

pub mod attrs;
pub mod clock;
pub mod error;
pub mod events;
pub mod player;
pub mod poster;
pub mod recording;
pub mod renderer;
pub mod sink;
pub mod time;
pub mod transport;

pub use attrs::{MediaAttributes, Preload};
pub use clock::{Clock, SystemClock};
pub use error::{TtyreelError, TtyreelResult};
pub use events::{MediaErrorCode, PlayerEvent};
pub use player::{CanPlayType, FetchToken, NetworkState, Player, ReadyState};
pub use poster::Poster;
pub use recording::{Chunk, Recording, TermSize};
pub use renderer::{TICK_INTERVAL, TIMEUPDATE_INTERVAL};
pub use sink::{NullSink, RenderSink, StdoutSink};
pub use time::format_time;
pub use transport::{FetchResponse, FsTransport, Transport};
