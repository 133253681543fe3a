// State file - an INI-like text format: a global `bucketcount`, then one
// `[label]` section per label with `stats`/`scale`/`limit`/`minduration`/
// `afterevent`/`withininterval` keys.
//
// Ported from `AudioIdStateLoad`/`AudioIdStateSave` in the original AudioId
// source; extended with `minduration`/`afterevent`/`withininterval`, which
// the original file format never persisted.

use std::fmt::Write as _;
use std::path::Path;

use crate::error::AudioIdError;
use crate::label::LabelTable;
use crate::stats::RunningStats;

fn trim_value(value: &str) -> &str {
    let value = value.trim();
    value.strip_prefix('"').and_then(|v| v.strip_suffix('"')).unwrap_or(value)
}

/// Load a state file's contents into `labels`, which must already be
/// configured with the right bucket count. Returns the number of malformed
/// lines skipped (mirroring the original's non-fatal-per-line behavior),
/// or `ConfigMismatch` if the file's `bucketcount` disagrees.
pub fn load(path: &Path, contents: &str, labels: &mut LabelTable) -> Result<usize, AudioIdError> {
    let mut current: Option<crate::label::LabelId> = None;
    let mut skipped = 0;

    for line in contents.lines() {
        let line = line.trim_end();
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix('[') {
            let Some(name) = rest.strip_suffix(']') else {
                skipped += 1;
                continue;
            };
            if name.is_empty() {
                current = None;
            } else {
                current = Some(labels.get_or_insert(name)?);
            }
            continue;
        }

        let Some((name, value)) = trimmed.split_once('=') else {
            skipped += 1;
            continue;
        };
        let name = name.trim();
        let value = trim_value(value);

        match current {
            None => {
                if name == "bucketcount" {
                    let found: usize = value.parse().map_err(|_| AudioIdError::ParseError {
                        kind: "bucketcount",
                        path: path.to_path_buf(),
                        line: 0,
                        message: value.to_string(),
                    })?;
                    if found != labels.bucket_count() {
                        return Err(AudioIdError::ConfigMismatch {
                            expected: labels.bucket_count(),
                            found,
                        });
                    }
                } else {
                    skipped += 1;
                }
            }
            Some(id) => match name {
                "stats" => {
                    let bucket_count = labels.bucket_count();
                    match parse_stats(value, bucket_count) {
                        Some(stats) => labels.get_mut(id).template = stats,
                        None => skipped += 1,
                    }
                }
                "scale" => match value.parse() {
                    Ok(v) => labels.get_mut(id).scale = v,
                    Err(_) => skipped += 1,
                },
                "limit" => match value.parse() {
                    Ok(v) => labels.get_mut(id).limit = v,
                    Err(_) => skipped += 1,
                },
                "minduration" => match value.parse() {
                    Ok(v) => labels.get_mut(id).min_duration = v,
                    Err(_) => skipped += 1,
                },
                "withininterval" => match value.parse() {
                    Ok(v) => labels.get_mut(id).within_interval = v,
                    Err(_) => skipped += 1,
                },
                "afterevent" => {
                    if !value.is_empty() {
                        let after = labels.get_or_insert(value)?;
                        labels.get_mut(id).after_event = Some(after);
                    }
                }
                _ => skipped += 1,
            },
        }
    }

    Ok(skipped)
}

fn parse_stats(value: &str, bucket_count: usize) -> Option<Vec<RunningStats>> {
    let mut result = Vec::with_capacity(bucket_count);
    for token in value.split(';') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let mut parts = token.split_whitespace();
        let (Some(count), Some(mean), Some(sum_var)) = (parts.next(), parts.next(), parts.next()) else {
            return None;
        };
        let (Ok(count), Ok(mean), Ok(sum_var)) =
            (count.parse::<u32>(), mean.parse::<f64>(), sum_var.parse::<f64>())
        else {
            return None;
        };
        result.push(RunningStats::from_parts(count, mean, sum_var));
    }
    if result.len() == bucket_count {
        Some(result)
    } else {
        None
    }
}

/// Serialize every label's template and gating parameters in the same
/// format [`load`] reads.
pub fn save(labels: &LabelTable) -> String {
    let mut out = String::new();
    out.push_str("# AudioID state file -- this file will be overwritten if the --write-state option is used\n\n");
    writeln!(out, "bucketcount = {}\n", labels.bucket_count()).unwrap();

    for (_, label) in labels.iter() {
        writeln!(out, "[{}]", label.text).unwrap();

        out.push_str("stats = \"");
        for (i, stat) in label.template.iter().enumerate() {
            if i > 0 {
                out.push_str("; ");
            }
            write!(out, "{} {} {}", stat.count(), stat.mean(), stat.sum_var()).unwrap();
        }
        out.push_str("\"\n");

        writeln!(out, "scale = {}", label.scale).unwrap();
        writeln!(out, "limit = {}", label.limit).unwrap();
        writeln!(out, "minduration = {}", label.min_duration).unwrap();
        writeln!(out, "withininterval = {}", label.within_interval).unwrap();
        if let Some(after) = label.after_event {
            writeln!(out, "afterevent = {}", labels.get(after).text).unwrap();
        }
        out.push('\n');
    }

    out
}
