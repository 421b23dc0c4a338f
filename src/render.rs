//! Plain-text exposition for pull-based monitoring.

use crate::derive::Metric;
use crate::metric_set::MetricSet;

pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// One `name{key="value",...} value` line per metric.
pub fn render_metrics(metrics: &MetricSet, out: &mut String) {
    for metric in metrics {
        render_metric(metric, out);
    }
}

pub fn render_metric(metric: &Metric, out: &mut String) {
    out.push_str(metric.name());
    if !metric.tags().is_empty() {
        out.push('{');
        for (i, (key, value)) in metric.tags().iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(&format!("{}=\"{}\"", key, escape_value(value)));
        }
        out.push('}');
    }
    out.push(' ');
    out.push_str(&format_value(metric.value()));
    out.push('\n');
}

fn escape_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Shortest representation that reads back to the same float.
pub fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        let sign = if value > 0.0 { '+' } else { '-' };
        format!("{}Inf", sign)
    } else {
        value.to_string()
    }
}
