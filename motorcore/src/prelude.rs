//! Everything needed to wire a controller together.

pub use crate::{
    BlockingReceive, Direction, IndicatorKind, MotorActuator, SerialTransport, StatusIndicator,
    channel::{ChannelStats, FrameChannel},
    common::{Connection, HBridge, Led, LedBank},
    control::{ControlConfig, ControlTask, PassOutcome, SpeedMapping},
    protocol::frame::{ACK_BYTE, DecodedFrame, RawFrame},
    receiver::ByteReceiver,
    scheduler::{ScheduleEntry, ScheduleError, Scheduler, Task, TickFlag},
};

#[cfg(feature = "std")]
pub use crate::{
    protocol::{
        AsyncSerial,
        commander::{Commander, CommanderError, MotorCommand, SPEED_STEPS},
    },
    std::{AckSender, LoggingIndicator, LoggingMotor, SharedIndicator},
};
