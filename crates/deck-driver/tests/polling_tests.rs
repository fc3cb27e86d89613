//! 轮询节奏集成测试
//!
//! 通过模拟设备服务的读取记录验证快速/标准两种刷新节奏，以及断开后的过期读取语义。

use deck_driver::*;
use deck_protocol::{DeviceIdentity, FloorSpeeds, QuaternionVector4, Ring};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

fn connected_link() -> (DeviceLink<SimulatedService>, SimulatedHandle) {
    let (service, handle) = SimulatedService::new();
    let mut link = DeviceLink::new(service);
    assert!(link.try_establish().is_connected());
    (link, handle)
}

fn standard_read_kinds() -> [ReadKind; 9] {
    [
        ReadKind::SpeedMagnitude,
        ReadKind::SpeedAngle,
        ReadKind::Ring,
        ReadKind::PauseState,
        ReadKind::VirtualRingEnabled,
        ReadKind::ReferenceAngleDelta,
        ReadKind::DeviceIdentity,
        ReadKind::DeviceIdentity,
        ReadKind::DeviceIdentity,
    ]
}

/// 9 次标准刷新恰好覆盖全部字段一次，第 10 次回到第 0 个字段
#[test]
fn test_round_robin_covers_each_field_once_then_wraps() {
    let (mut link, handle) = connected_link();
    let mut cache = PolledStateCache::new();

    let fields: Vec<StandardField> = (0..StandardField::COUNT)
        .map(|_| cache.refresh_standard(&mut link))
        .collect();

    assert_eq!(fields, StandardField::ORDER.to_vec());
    assert_eq!(handle.reads(), standard_read_kinds().to_vec());
    assert_eq!(cache.cursor(), 0);

    handle.clear_reads();
    assert_eq!(
        cache.refresh_standard(&mut link),
        StandardField::SpeedMagnitude
    );
    assert_eq!(handle.reads(), vec![ReadKind::SpeedMagnitude]);
    assert_eq!(link.metrics().snapshot().standard_refreshes, 10);
}

/// 断开后任何刷新都不会改变已缓存的值
#[test]
fn test_stale_read_after_disconnect() {
    let (service, handle) = SimulatedService::new();
    handle.update(|s| {
        s.floor_speeds = FloorSpeeds::new(0.8, -0.2);
        s.run_state = true;
        s.ring = Ring::new(0.1, 0.0, -0.1, 0.6);
        s.pause_state = true;
        s.reference_angle_delta = QuaternionVector4::new(0.9, 0.1, 0.2, 0.3);
    });

    let mut session = DeckSession::new(service, DeckConfig::default());
    let t0 = Instant::now();
    session.activate(t0);
    for i in 0..StandardField::COUNT as u64 {
        session.tick(t0 + Duration::from_millis(i));
    }
    let before = session.telemetry().clone();
    assert_eq!(before.floor_speeds, FloorSpeeds::new(0.8, -0.2));
    assert_eq!(before.identity.model_number, "SIMDECK");

    // 设备侧数据全部变化，然后服务消失
    handle.update(|s| {
        s.floor_speeds = FloorSpeeds::ZERO;
        s.run_state = false;
        s.ring = Ring::default();
        s.identity = DeviceIdentity::new("OTHER", "OTHER", "9");
        s.reachable = false;
    });
    session.tick(t0 + Duration::from_secs(1));
    assert!(!session.is_connected());

    handle.clear_reads();
    for i in 0..20 {
        session.tick(t0 + Duration::from_secs(1) + Duration::from_millis(i));
    }
    assert_eq!(*session.telemetry(), before);
    assert_eq!(*session.reader().load(), before);
    assert!(handle.reads().is_empty());
}

/// 直接调用缓存刷新（不经过会话）同样是空操作
#[test]
fn test_cache_refresh_noop_on_disconnected_link() {
    let (mut link, handle) = connected_link();
    let mut cache = PolledStateCache::new();
    handle.set_floor_speeds(0.5, 0.5);
    cache.refresh_fast(&mut link);
    let before = cache.snapshot().clone();

    handle.set_reachable(false);
    link.try_establish();
    handle.set_floor_speeds(3.0, 3.0);

    assert!(!cache.refresh_fast(&mut link));
    for _ in 0..StandardField::COUNT {
        cache.refresh_standard(&mut link);
    }
    assert_eq!(*cache.snapshot(), before);
}

/// 快速字段每 tick 刷新一次
#[test]
fn test_fast_fields_every_tick() {
    let (service, handle) = SimulatedService::new();
    let mut session = DeckSession::new(service, DeckConfig::default());
    let t0 = Instant::now();
    session.activate(t0);

    for i in 0..30 {
        session.tick(t0 + Duration::from_millis(i * 16));
    }
    let reads = handle.reads();
    let fast = reads
        .iter()
        .filter(|r| matches!(r, ReadKind::FloorSpeeds))
        .count();
    let run = reads
        .iter()
        .filter(|r| matches!(r, ReadKind::RunState))
        .count();
    assert_eq!(fast, 30);
    assert_eq!(run, 30);
    assert_eq!(session.metrics().snapshot().fast_refreshes, 30);
}

/// 跨线程读者在 tick 线程持续发布时始终能读到完整快照
#[test]
fn test_snapshot_reader_concurrent() {
    let (service, handle) = SimulatedService::new();
    let mut session = DeckSession::new(service, DeckConfig::default());
    let reader = session.reader();
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let reader = reader.clone();
            let done = done.clone();
            thread::spawn(move || {
                while !done.load(Ordering::Relaxed) {
                    let snapshot = reader.load();
                    // v0 与 v1 总是成对写入
                    assert_eq!(snapshot.floor_speeds.v0, snapshot.floor_speeds.v1);
                    thread::yield_now();
                }
            })
        })
        .collect();

    let t0 = Instant::now();
    session.activate(t0);
    for i in 0..500u64 {
        let v = i as f64 * 0.01;
        handle.set_floor_speeds(v, v);
        session.tick(t0 + Duration::from_millis(i));
    }
    done.store(true, Ordering::Relaxed);

    for r in readers {
        r.join().unwrap();
    }
    let last = 499.0 * 0.01;
    assert_eq!(reader.load().floor_speeds, FloorSpeeds::new(last, last));
}
