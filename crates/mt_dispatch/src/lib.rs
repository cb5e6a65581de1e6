pub mod chunker;
pub mod dispatcher;
pub mod inflight;
pub mod listener;
pub mod logging;
pub mod message;
pub mod retry;
pub mod trigger;

pub use chunker::{chunk, message_segments};
pub use dispatcher::{
    DispatchConfig, DispatchError, DispatchReport, Dispatcher, Outcome, Stage, StageEvent,
};
pub use inflight::{InFlightGuard, InFlightSet};
pub use listener::{EventLoop, LoopStats};
pub use logging::{init_logging, Logger};
pub use retry::RetryPolicy;
pub use trigger::{route, Action, Trigger};
