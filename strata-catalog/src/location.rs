use strata_result::{Error, Result};

use crate::dataset::Dataset;

/// Render a dataset's location template into its concrete base location.
///
/// The interpolation context is the descriptor's own fields (`layer`,
/// `name`, `format`, and `compression` when set) overlaid by `params`,
/// with params winning on collision. `{{` and `}}` are literal braces.
///
/// The rendered base is canonicalized: trailing slashes are stripped (but
/// never into the `://` of a scheme-only location), and pinned partitions
/// are appended as `/k1=v1/k2=v2` in `partition_by` order. The result never
/// ends in a slash.
pub fn render_location(dataset: &Dataset) -> Result<String> {
    let rendered = interpolate(&dataset.location, dataset)?;
    let mut location = trim_trailing_slashes(&rendered).to_string();
    let suffix = partition_path(dataset);
    if !suffix.is_empty() {
        location.push('/');
        location.push_str(&suffix);
    }
    Ok(location)
}

/// The `k1=v1/k2=v2` suffix for the dataset's pinned partitions, in
/// `partition_by` order. Empty when nothing is pinned.
pub fn partition_path(dataset: &Dataset) -> String {
    let mut path = String::new();
    for (key, value) in dataset.pinned_partitions() {
        if !path.is_empty() {
            path.push('/');
        }
        path.push_str(key);
        path.push('=');
        path.push_str(value);
    }
    path
}

fn interpolate(template: &str, dataset: &Dataset) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' => {
                if chars.peek() == Some(&'{') {
                    chars.next();
                    out.push('{');
                    continue;
                }
                let mut placeholder = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    placeholder.push(c);
                }
                if !closed {
                    return Err(Error::configuration(format!(
                        "location template '{template}' has an unclosed '{{'"
                    )));
                }
                match lookup(dataset, &placeholder) {
                    Some(value) => out.push_str(&value),
                    None => {
                        return Err(Error::Location {
                            placeholder,
                            template: template.to_string(),
                        })
                    }
                }
            }
            '}' => {
                if chars.peek() == Some(&'}') {
                    chars.next();
                    out.push('}');
                    continue;
                }
                return Err(Error::configuration(format!(
                    "location template '{template}' has an unmatched '}}'"
                )));
            }
            _ => out.push(c),
        }
    }
    Ok(out)
}

fn lookup(dataset: &Dataset, placeholder: &str) -> Option<String> {
    if let Some(value) = dataset.params.get(placeholder) {
        return Some(value.clone());
    }
    match placeholder {
        "layer" => Some(dataset.layer.clone()),
        "name" => Some(dataset.name.clone()),
        "format" => Some(dataset.format.to_string()),
        "compression" => dataset.compression.clone(),
        _ => None,
    }
}

fn trim_trailing_slashes(rendered: &str) -> &str {
    let mut s = rendered;
    while s.ends_with('/') && !s.ends_with("://") {
        s = &s[..s.len() - 1];
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DatasetOptions;
    use crate::format::Format;
    use crate::resolve::resolve_dataset;
    use strata_config::{DatasetEntry, StaticConfig};

    fn dataset(location: &str, options: DatasetOptions) -> Dataset {
        let config = StaticConfig::new().with_dataset(
            "raw",
            "orders",
            DatasetEntry {
                location: location.to_string(),
                format: Some("csv".to_string()),
                partition_by: vec!["l1".to_string(), "l2".to_string()],
                ..DatasetEntry::default()
            },
        );
        resolve_dataset(&config, "raw", "orders", options).unwrap()
    }

    #[test]
    fn renders_fields_and_params() {
        let ds = dataset(
            "file:///data/{layer}/{name}.{format}",
            DatasetOptions::new(),
        );
        assert_eq!(
            render_location(&ds).unwrap(),
            "file:///data/raw/orders.csv"
        );
    }

    #[test]
    fn params_win_over_fields() {
        let ds = dataset(
            "file:///data/{name}",
            DatasetOptions::new().param("name", "renamed"),
        );
        assert_eq!(render_location(&ds).unwrap(), "file:///data/renamed");
    }

    #[test]
    fn missing_placeholder_names_template_and_parameter() {
        let ds = dataset("s3://lake/{env}/orders", DatasetOptions::new());
        match render_location(&ds).unwrap_err() {
            Error::Location {
                placeholder,
                template,
            } => {
                assert_eq!(placeholder, "env");
                assert_eq!(template, "s3://lake/{env}/orders");
            }
            other => panic!("expected location error, got {other:?}"),
        }
    }

    #[test]
    fn doubled_braces_are_literal() {
        let ds = dataset("file:///data/{{raw}}/orders", DatasetOptions::new());
        assert_eq!(
            render_location(&ds).unwrap(),
            "file:///data/{raw}/orders"
        );
    }

    #[test]
    fn unclosed_brace_is_a_configuration_error() {
        let ds = dataset("file:///data/{name", DatasetOptions::new());
        assert!(matches!(
            render_location(&ds).unwrap_err(),
            Error::Configuration(msg) if msg.contains("unclosed")
        ));
    }

    #[test]
    fn trailing_slashes_are_stripped() {
        let ds = dataset("file:///data/orders///", DatasetOptions::new());
        assert_eq!(render_location(&ds).unwrap(), "file:///data/orders");
    }

    #[test]
    fn scheme_only_location_keeps_its_slashes() {
        let ds = dataset("file:///", DatasetOptions::new());
        assert_eq!(render_location(&ds).unwrap(), "file:///");
    }

    #[test]
    fn pinned_partitions_extend_the_path() {
        let ds = dataset(
            "file:///tmp/ds",
            DatasetOptions::new().param("l1", "A").param("l2", "B"),
        );
        assert_eq!(render_location(&ds).unwrap(), "file:///tmp/ds/l1=A/l2=B");
        assert_eq!(partition_path(&ds), "l1=A/l2=B");
    }

    #[test]
    fn partition_path_is_empty_without_pins() {
        let ds = dataset("file:///tmp/ds", DatasetOptions::new());
        assert_eq!(partition_path(&ds), "");
        assert_eq!(render_location(&ds).unwrap(), "file:///tmp/ds");
    }

    #[test]
    fn compression_is_available_when_set() {
        let ds = dataset(
            "file:///data/orders.{format}.{compression}",
            DatasetOptions::new().compression("gzip"),
        );
        assert_eq!(
            render_location(&ds).unwrap(),
            "file:///data/orders.csv.gzip"
        );
        assert_eq!(ds.format, Format::Csv);
    }
}
