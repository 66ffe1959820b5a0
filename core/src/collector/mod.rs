pub mod channels;
pub mod command;
pub mod iperf;
pub mod link;
pub mod scan;
pub mod system;
pub mod text;

pub use command::{CommandOutput, CommandRunner, SystemRunner};
pub use iperf::{IperfMetrics, MeasurementResult, ThroughputProbe};
pub use link::LinkStatus;
pub use scan::NeighborRecord;
pub use system::{CollectorConfig, SystemCollector};
pub use text::RawString;
