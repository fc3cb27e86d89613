//! # Deck Driver
//!
//! 全向跑步机设备服务的驱动核心：
//! - 连接生命周期管理（`DeviceLink`，慢速固定间隔重连）
//! - 分节奏遥测轮询（快速字段每 tick、标准字段轮询、ArcSwap 无锁发布）
//! - 偏航修正的位移换算（`translate` / `LocomotionTranslator`）
//! - 尽力而为的单向命令（`CommandGateway`）
//!
//! # 线程模型
//!
//! 单线程协作式：所有状态修改都发生在调用 [`DeckSession::tick`] 的线程上。
//! 诊断面板等跨线程读者只通过 [`SnapshotReader`] 和 [`DeckMetrics`] 读取。
//!
//! # 示例
//!
//! ```
//! use deck_driver::{DeckConfig, DeckSession, SimulatedService};
//! use std::time::Instant;
//!
//! let (service, handle) = SimulatedService::new();
//! handle.set_floor_speeds(1.0, 0.0);
//!
//! let mut session = DeckSession::new(service, DeckConfig::default());
//! let now = Instant::now();
//! session.activate(now);
//! session.tick(now);
//!
//! let step = session.locomotion_step(0.1, 0.0, 1.0).unwrap();
//! assert!((step.x - 0.1).abs() < 1e-12);
//!
//! session.shutdown();
//! assert_eq!(handle.stop_count(), 1);
//! ```

pub mod cache;
pub mod command;
pub mod config;
mod error;
pub mod link;
pub mod locomotion;
pub mod metrics;
pub mod scheduler;
pub mod service;
pub mod session;
pub mod simulated;

pub use cache::{PolledStateCache, SnapshotReader, StandardField, TelemetrySnapshot};
pub use command::CommandGateway;
pub use config::DeckConfig;
pub use error::{ConfigError, DriverError};
pub use link::DeviceLink;
pub use locomotion::{DisplacementVector, LocomotionTranslator, MoveObserver, translate};
pub use metrics::{DeckMetrics, MetricsSnapshot};
pub use scheduler::RepeatingTask;
pub use service::{DeviceCommand, DeviceService};
pub use session::{DeckSession, TickOutcome};
pub use simulated::{ReadKind, SimulatedHandle, SimulatedService, SimulatedState};
