use std::sync::LazyLock;

use prometheus::*;

static METRIC_QUERY_IMAGE_COUNT: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!("vf_query_image_count", "count of the image to query", &["size"])
        .unwrap()
});

static METRIC_QUERY_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    register_histogram_vec!(
        "vf_query_duration",
        "duration of the per-image query in seconds",
        &["size"]
    )
    .unwrap()
});

static METRIC_QUERY_MAX_SCORE: LazyLock<Histogram> = LazyLock::new(|| {
    register_histogram!(
        "vf_query_max_score",
        "max cosine similarity of the per-image query",
        (0..=20).map(|x| x as f64 / 20.).collect()
    )
    .unwrap()
});

static METRIC_INGEST_FRAMES: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!("vf_ingest_frames", "count of the sampled frames", &["result"])
        .unwrap()
});

/// 增加查询图片计数
pub fn inc_image_count(size: (u32, u32)) {
    METRIC_QUERY_IMAGE_COUNT.with_label_values(&[to_fixed_size(size)]).inc();
}

pub fn inc_query_duration(size: (u32, u32), duration: f32) {
    METRIC_QUERY_DURATION.with_label_values(&[to_fixed_size(size)]).observe(duration as f64);
}

pub fn inc_query_max_score(score: f32) {
    METRIC_QUERY_MAX_SCORE.observe(score as f64);
}

/// 记录入库帧数，`result` 为 stored 或 skipped
pub fn inc_ingest_frames(result: &str, count: u64) {
    METRIC_INGEST_FRAMES.with_label_values(&[result]).inc_by(count);
}

/// 将图像面积范围调整到几个固定值
fn to_fixed_size((width, height): (u32, u32)) -> &'static str {
    let area = width as u64 * height as u64;
    if area <= 128 * 128 {
        "128"
    } else if area <= 256 * 256 {
        "256"
    } else if area <= 512 * 512 {
        "512"
    } else if area <= 1024 * 1024 {
        "1024"
    } else if area <= 2048 * 2048 {
        "2048"
    } else {
        "2048+"
    }
}
