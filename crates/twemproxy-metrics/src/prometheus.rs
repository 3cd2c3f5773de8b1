//! Prometheus text exposition format.
//!
//! Renders a [`Collection`] into the text format for scraping by a
//! Prometheus server or compatible agent.

use crate::descriptor::{DESCRIPTORS, UP};
use crate::exporter::Collection;
use crate::observation::Observation;

/// Content type of the rendered exposition.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Render a collection into Prometheus text format.
///
/// Every descriptor gets its HELP and TYPE lines, in table order, even
/// when the scrape failed and it has no samples. `up` always has one.
pub fn render_prometheus(collection: &Collection) -> String {
    let mut out = String::new();

    for desc in DESCRIPTORS {
        let name = desc.name();
        out.push_str(&format!("# HELP {name} {}\n", desc.help));
        out.push_str(&format!("# TYPE {name} {}\n", desc.kind.as_str()));

        if std::ptr::eq(desc, &UP) {
            write_sample(&mut out, &name, &collection.up_observation());
            continue;
        }

        for obs in collection.observations.iter().filter(|o| o.metric == desc) {
            write_sample(&mut out, &name, obs);
        }
    }

    out
}

fn write_sample(out: &mut String, name: &str, obs: &Observation) {
    out.push_str(name);

    let pairs = obs.labels.pairs();
    if !pairs.is_empty() {
        out.push('{');
        for (i, (label, value)) in pairs.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(&format!("{label}=\"{}\"", escape_label_value(value)));
        }
        out.push('}');
    }

    out.push(' ');
    out.push_str(&format_value(obs.value));
    out.push('\n');
}

fn escape_label_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "+Inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        format!("{value}")
    }
}
