use loka_fixed_metrics::{FixedPrecisionCounter, FixedPrecisionGauge, MetricsConfig, Recorder};
use prometheus::{Encoder, Opts, Registry, TextEncoder};

fn main() {
    tracing_subscriber::fmt().init();

    println!("=== Registry Export ===\n");
    registry_export();

    println!("\n=== Metrics Facade ===\n");
    facade_recording();
}

fn registry_export() {
    let registry = Registry::new();

    let bytes = FixedPrecisionCounter::with_opts(
        Opts::new("bytes_received_kb", "Kilobytes received").namespace("loka"),
        3,
    )
    .expect("Failed to describe counter");
    let load = FixedPrecisionGauge::with_opts(
        Opts::new("load_average", "One minute load average").namespace("loka"),
        2,
    )
    .expect("Failed to describe gauge");
    let started = FixedPrecisionGauge::with_opts(
        Opts::new("start_time_seconds", "Process start time").namespace("loka"),
        0,
    )
    .expect("Failed to describe gauge");

    registry
        .register(Box::new(bytes.clone()))
        .expect("Failed to register counter");
    registry
        .register(Box::new(load.clone()))
        .expect("Failed to register gauge");
    registry
        .register(Box::new(started.clone()))
        .expect("Failed to register gauge");

    started.set_to_current_time();

    // Simulate packet sizes in KB
    for size in [1.5, 0.512, 64.0, 0.0009, 12.25] {
        bytes.add(size);
    }

    // Simulate load average samples
    for sample in [0.42, 0.87, 1.13] {
        load.add(sample);
        load.sub(sample / 2.0);
    }

    println!("Bytes received: {:.3} KB", bytes.value());
    println!("Load average: {:.2}", load.value());

    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&registry.gather(), &mut buffer)
        .expect("Failed to encode metrics");

    println!("\n{}", String::from_utf8_lossy(&buffer));
}

fn facade_recording() {
    let config = MetricsConfig {
        precision: 2,
        namespace: Some("app".to_string()),
        ..Default::default()
    };
    let recorder = Recorder::init_with(config).expect("Failed to initialize metrics recorder");

    metrics::describe_counter!("requests.total", "Requests served");

    for (i, latency) in [12.5, 48.0, 7.25, 130.75].iter().enumerate() {
        metrics::counter!("requests.total", "route" => "/jobs").increment(1);
        metrics::gauge!("requests.last_latency_ms").set(*latency);
        metrics::gauge!("connections.active").increment(1.0);

        println!("  Request {}: {:.2} ms", i + 1, latency);
    }

    metrics::gauge!("connections.active").decrement(2.0);

    println!("\nCounters: {:#?}", recorder.counters());
    println!("Gauges: {:#?}", recorder.gauges());

    match recorder.render() {
        Ok(text) => println!("\n{}", text),
        Err(err) => eprintln!("Failed to render metrics: {}", err),
    }
}
