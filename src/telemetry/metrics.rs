use opentelemetry::{
    global,
    metrics::{Counter, Histogram, Meter},
};
use std::sync::LazyLock;

pub static METER: LazyLock<Meter> =
    LazyLock::new(|| global::meter("drug-repurposing-analyzer"));

// --- Analysis Metrics ---

pub static ANALYSES_TOTAL: LazyLock<Counter<u64>> = LazyLock::new(|| {
    METER
        .u64_counter("analysis.requests.total")
        .with_description("Number of drug analyses run, by outcome")
        .with_unit("{analysis}")
        .build()
});

pub static ANALYSIS_DURATION: LazyLock<Histogram<f64>> = LazyLock::new(|| {
    METER
        .f64_histogram("analysis.duration")
        .with_description("End-to-end analysis duration including report rendering")
        .with_unit("s")
        .build()
});

// --- Report Metrics ---

pub static REPORT_SECTIONS: LazyLock<Histogram<f64>> = LazyLock::new(|| {
    METER
        .f64_histogram("report.sections")
        .with_description("Number of sections rendered per report")
        .with_unit("{section}")
        .build()
});

pub static REPORT_SIZE_BYTES: LazyLock<Histogram<f64>> = LazyLock::new(|| {
    METER
        .f64_histogram("report.size")
        .with_description("Size of rendered PDF reports")
        .with_unit("By")
        .build()
});

pub static REPORT_CHARTS: LazyLock<Counter<u64>> = LazyLock::new(|| {
    METER
        .u64_counter("report.charts")
        .with_description("Number of charts embedded into reports")
        .with_unit("{chart}")
        .build()
});

// --- HTTP Metrics ---

pub static HTTP_REQUESTS_TOTAL: LazyLock<Counter<u64>> = LazyLock::new(|| {
    METER
        .u64_counter("http.requests.total")
        .with_description("Total number of HTTP requests")
        .with_unit("{request}")
        .build()
});

pub static HTTP_REQUEST_DURATION: LazyLock<Histogram<f64>> = LazyLock::new(|| {
    METER
        .f64_histogram("http.request.duration")
        .with_description("HTTP request duration in milliseconds")
        .with_unit("ms")
        .with_boundaries(vec![
            1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0,
        ])
        .build()
});
