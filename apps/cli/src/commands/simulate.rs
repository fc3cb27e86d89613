//! 模拟会话命令
//!
//! 以固定 tick 频率驱动 `DeckSession`，把位移累加到一个虚拟相机位置上。
//! Ctrl+C 会提前结束循环，会话关闭时向设备下发停止命令。

use super::config::load_config;
use anyhow::{Context, Result, bail};
use clap::Args;
use deck_driver::{
    DeckSession, DeviceService, MetricsSnapshot, SimulatedService, TelemetrySnapshot,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// 模拟会话参数
#[derive(Args, Debug)]
pub struct SimulateCommand {
    /// 运行时长（秒）
    #[arg(long, default_value_t = 5.0)]
    pub seconds: f64,

    /// tick 频率（Hz）
    #[arg(long, default_value_t = 60)]
    pub rate_hz: u32,

    /// 手动地面速度 X Y（m/s）
    #[arg(long, num_args = 2, value_names = ["X", "Y"], allow_negative_numbers = true)]
    pub speed: Option<Vec<f64>>,

    /// 消费方偏航角（度）
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub yaw_deg: f64,

    /// 消费方世界缩放
    #[arg(long, default_value_t = 1.0)]
    pub scale: f64,

    /// 虚拟房间半宽（米）；超出时位置被截断，用于触发碰撞观测
    #[arg(long)]
    pub bound: Option<f64>,

    /// 覆盖配置中的速度增益
    #[arg(long)]
    pub gain: Option<f64>,

    /// 模拟设备服务不可达
    #[arg(long)]
    pub unreachable: bool,

    /// 以 JSON 输出结果
    #[arg(long)]
    pub json: bool,

    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// 会话结束时的汇总
#[derive(Debug, Serialize)]
struct SimulationReport {
    ticks: u64,
    elapsed_secs: f64,
    connected: bool,
    diagnostic: String,
    position: [f64; 3],
    collisions: u64,
    telemetry: TelemetrySnapshot,
    metrics: MetricsSnapshot,
}

impl SimulateCommand {
    /// 检查参数，返回运行时长
    fn validate(&self) -> Result<Duration> {
        if !is_positive(self.seconds) {
            bail!("--seconds must be a positive number");
        }
        let run_for = Duration::try_from_secs_f64(self.seconds)
            .context("--seconds is too large")?;
        if !is_positive(self.scale) {
            bail!("--scale must be a positive number");
        }
        if let Some(bound) = self.bound
            && !is_positive(bound)
        {
            bail!("--bound must be a positive number");
        }
        if self.rate_hz == 0 {
            bail!("--rate-hz must be greater than 0");
        }
        Ok(run_for)
    }

    pub fn execute(self) -> Result<()> {
        let run_for = self.validate()?;

        let mut config = load_config(self.config.as_deref())?;
        if let Some(gain) = self.gain {
            config.speed_gain = gain;
        }
        config.validate().context("配置无效")?;

        let (service, handle) = SimulatedService::new();
        handle.set_recording(false);
        if self.unreachable {
            handle.set_reachable(false);
        }

        let running = Arc::new(AtomicBool::new(true));
        let r = running.clone();
        ctrlc::set_handler(move || {
            r.store(false, Ordering::SeqCst);
        })
        .context("设置 Ctrl+C 处理失败")?;

        let mut session = DeckSession::new(service, config);
        let start = Instant::now();
        session.activate(start);

        if let Some(speed) = &self.speed {
            let mut commands = session.commands();
            commands.start_manual_control();
            commands.set_manual_speeds(speed[0], speed[1]);
        }

        let period = Duration::from_secs_f64(1.0 / self.rate_hz as f64);
        let deadline = start
            .checked_add(run_for)
            .context("--seconds is too large")?;
        let yaw = self.yaw_deg.to_radians();

        let mut position = [0.0_f64; 3];
        let mut ticks = 0u64;
        let mut last_tick = start;
        let mut next_tick = start;
        let mut last_report = start;
        let mut was_connected = false;

        while running.load(Ordering::SeqCst) {
            let now = Instant::now();
            if now >= deadline {
                break;
            }

            let outcome = session.tick(now);
            ticks += 1;
            if outcome.connected != was_connected {
                was_connected = outcome.connected;
                if was_connected {
                    info!("Connected to simulated device");
                } else {
                    warn!("Disconnected: {}", describe_failure(&session));
                }
            }

            let dt = now.duration_since(last_tick).as_secs_f64();
            last_tick = now;

            if let Some(step) = session.locomotion_step(dt, yaw, self.scale) {
                let observer = session.move_observer();
                observer.pre_move(position);
                let target = step.apply_to(position);
                position = match self.bound {
                    Some(bound) => clamp_horizontal(target, bound),
                    None => target,
                };
                observer.post_move(target, position);
            }

            if now.duration_since(last_report) >= Duration::from_secs(1) {
                last_report = now;
                let speeds = session.telemetry().floor_speeds;
                info!(
                    x = position[0],
                    z = position[2],
                    v0 = speeds.v0,
                    v1 = speeds.v1,
                    "Position update"
                );
            }

            next_tick += period;
            let now = Instant::now();
            if next_tick > now {
                spin_sleep::sleep(next_tick - now);
            } else {
                // 追赶锚点
                next_tick = now;
            }
        }

        let report = SimulationReport {
            ticks,
            elapsed_secs: start.elapsed().as_secs_f64(),
            connected: session.is_connected(),
            diagnostic: describe_failure(&session),
            position,
            collisions: session.move_observer().collisions(),
            telemetry: session.telemetry().clone(),
            metrics: session.metrics().snapshot(),
        };

        session.shutdown();
        info!(stops = handle.stop_count(), "Session closed");

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print_report(&report);
        }
        Ok(())
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn clamp_horizontal(position: [f64; 3], bound: f64) -> [f64; 3] {
    [
        position[0].clamp(-bound, bound),
        position[1],
        position[2].clamp(-bound, bound),
    ]
}

/// 诊断字符串；服务不可达时没有握手错误码，退回到失败分类
fn describe_failure<S: DeviceService>(session: &DeckSession<S>) -> String {
    match session.link().last_failure() {
        Some(_) if !session.diagnostic().is_empty() => session.diagnostic().to_string(),
        Some(failure) => failure.to_string(),
        None => String::new(),
    }
}

fn print_report(report: &SimulationReport) {
    println!("Ticks:        {} in {:.2}s", report.ticks, report.elapsed_secs);
    if report.connected {
        println!("Connection:   connected");
    } else {
        println!("Connection:   disconnected ({})", report.diagnostic);
    }
    println!(
        "Position:     x={:.4} y={:.4} z={:.4}",
        report.position[0], report.position[1], report.position[2]
    );
    println!(
        "Floor speed:  ({:.3}, {:.3}) m/s",
        report.telemetry.floor_speeds.v0, report.telemetry.floor_speeds.v1
    );
    if !report.telemetry.identity.is_empty() {
        println!("Device:       {}", report.telemetry.identity);
    }
    println!("Collisions:   {}", report.collisions);
    println!(
        "Commands:     {} sent, {} dropped ({:.1}%)",
        report.metrics.commands_sent,
        report.metrics.commands_dropped,
        report.metrics.command_drop_rate()
    );
    println!(
        "Handshakes:   {} ok, {} failed, {} unreachable",
        report.metrics.handshakes_succeeded,
        report.metrics.handshakes_failed,
        report.metrics.service_unreachable
    );
}
