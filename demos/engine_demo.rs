//! Demonstration of the EmpathAI emotion engine.
//!
//! This example shows how to:
//! 1. Build an engine with an in-process event source
//! 2. Subscribe to emotion changes
//! 3. Feed synthetic pointer and keyboard activity
//! 4. Inspect metrics and transparency statistics
//!
//! Run with: cargo run --example engine_demo

use std::thread;
use std::time::Duration;

use empath_sensor::{EmotionEngine, EngineConfig, ManualSource, PRIVACY_DECLARATION};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter("empath_sensor=info")
        .init();

    println!("EmpathAI Sensor - Engine Demo");
    println!("=============================");
    println!();
    println!("{PRIVACY_DECLARATION}");

    let config = EngineConfig {
        analysis_interval: Duration::from_millis(250),
        ..EngineConfig::default()
    };

    let source = ManualSource::new();
    let engine = match EmotionEngine::builder(config)
        .source(source.clone())
        .on_start(|| println!("Engine started"))
        .build()
    {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error: {e}");
            return;
        }
    };

    let subscription = engine.subscribe(|snapshot| {
        println!(
            "→ {} (confidence {:.2}) at {}",
            snapshot.emotion,
            snapshot.confidence,
            snapshot.timestamp.format("%H:%M:%S%.3f")
        );
    });

    if let Err(e) = engine.start() {
        eprintln!("Error starting engine: {e}");
        return;
    }

    println!("Phase 1: idle");
    thread::sleep(Duration::from_millis(600));

    println!("Phase 2: steady typing");
    for _ in 0..20 {
        source.key_down("a");
        thread::sleep(Duration::from_millis(40));
    }
    thread::sleep(Duration::from_millis(400));

    println!("Phase 3: erratic pointer with corrections");
    for i in 0..20 {
        let dx = if i % 2 == 0 { 30.0 } else { 130.0 };
        source.pointer_move(dx, 0.0);
        thread::sleep(Duration::from_millis(60));
    }
    for _ in 0..5 {
        source.key_down("Backspace");
    }
    thread::sleep(Duration::from_millis(600));

    let metrics = engine.metrics();
    println!();
    println!(
        "Buffers: {} pointer / {} key samples, {} observer(s), active: {}",
        metrics.pointer_buffer_size,
        metrics.key_buffer_size,
        metrics.observer_count,
        metrics.is_active
    );

    subscription.unsubscribe();
    engine.stop();

    println!();
    println!("{}", engine.transparency_summary());
}
