//! Configuration-file parsing for the graphscale CLI.
//!
//! The format is `key=value`, one pair per line; empty lines and lines
//! starting with `#` or `;` are comments. Keys are case-insensitive;
//! values lose surrounding whitespace and quotes. Unparsable values and
//! unknown keys warn with their line number and leave the previous value
//! in place; validation at the end gathers every remaining problem into
//! one fatal error.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::warn;

/// Supported ingest formats.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReaderKind {
    /// Tab-separated node and edge files.
    Tsv,
}

/// Supported output sinks.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WriterKind {
    /// Tab-separated node and edge files.
    Tsv,
    /// Discard output, measure throughput.
    Benchmark,
}

/// A fully validated run configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Node TSV inputs, in the order configured.
    pub node_files: Vec<PathBuf>,
    /// Edge TSV inputs, in the order configured.
    pub edge_files: Vec<PathBuf>,
    /// Multiplicative growth target for nodes and edges.
    pub scale: f64,
    /// Global RNG seed; zero means "derive from the wall clock".
    pub rng_seed: u64,
    /// Where generated nodes are written.
    pub output_node_file: PathBuf,
    /// Where generated edges are written.
    pub output_edge_file: PathBuf,
    /// Which ingest implementation to use.
    pub reader: ReaderKind,
    /// Which output implementation to use.
    pub writer: WriterKind,
}

/// Errors raised while loading a configuration file.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file `{path}`: {source}")]
    Io {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// The configuration parsed but failed validation.
    #[error("invalid configuration:\n{}", .problems.join("\n"))]
    Invalid {
        /// One human-readable complaint per unmet requirement.
        problems: Vec<String>,
    },
}

const DEFAULT_OUTPUT_NODE_FILE: &str = "generated_nodes.tsv";
const DEFAULT_OUTPUT_EDGE_FILE: &str = "generated_edges.tsv";

#[derive(Debug, Default)]
struct Draft {
    node_files: Vec<PathBuf>,
    edge_files: Vec<PathBuf>,
    scale: Option<f64>,
    rng_seed: u64,
    output_node_file: Option<String>,
    output_edge_file: Option<String>,
    reader: Option<ReaderKind>,
    writer: Option<WriterKind>,
}

/// Loads and validates the configuration at `path`.
///
/// # Errors
/// Returns [`ConfigError::Io`] when the file cannot be read and
/// [`ConfigError::Invalid`] listing every validation failure otherwise.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&text)
}

fn parse(text: &str) -> Result<Config, ConfigError> {
    let mut draft = Draft::default();

    for (index, line) in text.lines().enumerate() {
        let line_number = index + 1;
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        let Some((raw_key, raw_value)) = line.split_once('=') else {
            warn!(line_number, "ignoring line without a `=` separator");
            continue;
        };
        apply_key(&mut draft, raw_key, raw_value, line_number);
    }

    validate(draft)
}

fn apply_key(draft: &mut Draft, raw_key: &str, raw_value: &str, line_number: usize) {
    let key = raw_key.trim().to_ascii_uppercase();
    let value = clean_value(raw_value);

    match key.as_str() {
        "NODE_FILE" => draft.node_files.push(PathBuf::from(value)),
        "EDGE_FILE" => draft.edge_files.push(PathBuf::from(value)),
        "SCALE" => match value.parse::<f64>() {
            Ok(scale) => draft.scale = Some(scale),
            Err(_) => warn!(line_number, value, "could not parse scaling factor as a float"),
        },
        "RNG_SEED" => match value.parse::<u64>() {
            Ok(seed) => draft.rng_seed = seed,
            Err(_) => warn!(
                line_number,
                value, "could not parse RNG seed as an unsigned integer"
            ),
        },
        "OUTPUT_NODE_FILE" => draft.output_node_file = Some(value.to_owned()),
        "OUTPUT_EDGE_FILE" => draft.output_edge_file = Some(value.to_owned()),
        "READER_TYPE" => match value.to_ascii_uppercase().as_str() {
            "TSV" => draft.reader = Some(ReaderKind::Tsv),
            _ => warn!(line_number, value, "unknown reader type"),
        },
        "WRITER_TYPE" => match value.to_ascii_uppercase().as_str() {
            "TSV" => draft.writer = Some(WriterKind::Tsv),
            "BENCHMARK" => draft.writer = Some(WriterKind::Benchmark),
            _ => warn!(line_number, value, "unknown writer type"),
        },
        _ => warn!(line_number, key = %key, "unknown configuration key"),
    }
}

// Strips surrounding whitespace and quote characters from a value.
fn clean_value(raw: &str) -> &str {
    raw.trim_matches(|c: char| c.is_whitespace() || c == '"' || c == '\'')
}

fn validate(draft: Draft) -> Result<Config, ConfigError> {
    let mut problems = Vec::new();

    if draft.node_files.is_empty() {
        problems.push(
            "at least one node file is required; use NODE_FILE=<path> to add one".to_owned(),
        );
    }
    if draft.edge_files.is_empty() {
        problems.push(
            "at least one edge file is required; use EDGE_FILE=<path> to add one".to_owned(),
        );
    }

    match draft.scale {
        Some(scale) if scale.is_finite() && scale > 0.0 => {
            if scale <= 1.0 {
                warn!(
                    scale,
                    "a scaling factor above 1 is recommended; small factors \
                     amplify rounding losses and duplicate edges"
                );
            }
        }
        Some(scale) => problems.push(format!(
            "the scaling factor must be positive and finite; use SCALE=<factor> (got {scale})"
        )),
        None => problems
            .push("a scaling factor is required; use SCALE=<factor> to set one".to_owned()),
    }

    if matches!(draft.output_node_file.as_deref(), Some("")) {
        problems.push("OUTPUT_NODE_FILE is present but empty".to_owned());
    }
    if matches!(draft.output_edge_file.as_deref(), Some("")) {
        problems.push("OUTPUT_EDGE_FILE is present but empty".to_owned());
    }

    if draft.reader.is_none() {
        problems.push(
            "a reader type is required; use READER_TYPE=TSV to select the ingest format"
                .to_owned(),
        );
    }
    if draft.writer.is_none() {
        problems.push(
            "a writer type is required; use WRITER_TYPE=TSV or WRITER_TYPE=BENCHMARK".to_owned(),
        );
    }

    if !problems.is_empty() {
        return Err(ConfigError::Invalid { problems });
    }

    // The unwraps above are guarded by the problem list; destructure instead.
    let Draft {
        node_files,
        edge_files,
        scale: Some(scale),
        rng_seed,
        output_node_file,
        output_edge_file,
        reader: Some(reader),
        writer: Some(writer),
    } = draft
    else {
        return Err(ConfigError::Invalid {
            problems: vec!["configuration validation is inconsistent".to_owned()],
        });
    };

    Ok(Config {
        node_files,
        edge_files,
        scale,
        rng_seed,
        output_node_file: PathBuf::from(
            output_node_file.unwrap_or_else(|| DEFAULT_OUTPUT_NODE_FILE.to_owned()),
        ),
        output_edge_file: PathBuf::from(
            output_edge_file.unwrap_or_else(|| DEFAULT_OUTPUT_EDGE_FILE.to_owned()),
        ),
        reader,
        writer,
    })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use rstest::rstest;

    use super::{Config, ConfigError, ReaderKind, WriterKind, clean_value, parse};

    const VALID: &str = "\
# input\n\
NODE_FILE=nodes.tsv\n\
EDGE_FILE=edges.tsv\n\
SCALE=2.5\n\
RNG_SEED=7\n\
; output\n\
OUTPUT_NODE_FILE=out_nodes.tsv\n\
OUTPUT_EDGE_FILE=out_edges.tsv\n\
READER_TYPE=TSV\n\
WRITER_TYPE=TSV\n";

    fn parsed(text: &str) -> Config {
        parse(text).expect("configuration must be valid")
    }

    #[test]
    fn full_configuration_parses() {
        let config = parsed(VALID);
        assert_eq!(config.node_files, vec![PathBuf::from("nodes.tsv")]);
        assert_eq!(config.edge_files, vec![PathBuf::from("edges.tsv")]);
        assert!((config.scale - 2.5).abs() < f64::EPSILON);
        assert_eq!(config.rng_seed, 7);
        assert_eq!(config.reader, ReaderKind::Tsv);
        assert_eq!(config.writer, WriterKind::Tsv);
    }

    #[test]
    fn repeated_file_keys_accumulate() {
        let text = VALID.replace(
            "NODE_FILE=nodes.tsv\n",
            "NODE_FILE=first.tsv\nNODE_FILE=second.tsv\n",
        );
        let config = parsed(&text);
        assert_eq!(
            config.node_files,
            vec![PathBuf::from("first.tsv"), PathBuf::from("second.tsv")]
        );
    }

    #[rstest]
    #[case("writer_type= benchmark \n", WriterKind::Benchmark)]
    #[case("WRITER_TYPE=\"TSV\"\n", WriterKind::Tsv)]
    fn keys_and_enum_values_are_case_insensitive(
        #[case] line: &str,
        #[case] expected: WriterKind,
    ) {
        let text = VALID.replace("WRITER_TYPE=TSV\n", line);
        assert_eq!(parsed(&text).writer, expected);
    }

    #[rstest]
    #[case("  spaced  ", "spaced")]
    #[case("\"quoted\"", "quoted")]
    #[case("'single'", "single")]
    #[case("plain", "plain")]
    fn values_lose_whitespace_and_quotes(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(clean_value(raw), expected);
    }

    #[test]
    fn output_paths_default_when_unset() {
        let text = VALID
            .replace("OUTPUT_NODE_FILE=out_nodes.tsv\n", "")
            .replace("OUTPUT_EDGE_FILE=out_edges.tsv\n", "");
        let config = parsed(&text);
        assert_eq!(config.output_node_file, PathBuf::from("generated_nodes.tsv"));
        assert_eq!(config.output_edge_file, PathBuf::from("generated_edges.tsv"));
    }

    #[test]
    fn missing_mandatory_keys_are_all_reported() {
        let err = parse("# empty\n").expect_err("empty configuration is invalid");
        let ConfigError::Invalid { problems } = err else {
            panic!("expected validation failure");
        };
        // node files, edge files, scale, reader, writer
        assert_eq!(problems.len(), 5);
    }

    #[test]
    fn unparsable_scale_fails_validation() {
        let text = VALID.replace("SCALE=2.5\n", "SCALE=fast\n");
        assert!(matches!(
            parse(&text),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn unknown_writer_type_fails_validation() {
        let text = VALID.replace("WRITER_TYPE=TSV\n", "WRITER_TYPE=PARQUET\n");
        assert!(matches!(
            parse(&text),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn negative_scale_fails_validation() {
        let text = VALID.replace("SCALE=2.5\n", "SCALE=-3\n");
        assert!(matches!(
            parse(&text),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn comments_and_unknown_keys_are_ignored() {
        let text = format!("{VALID}# trailing comment\nUNKNOWN_KEY=1\n");
        let config = parsed(&text);
        assert_eq!(config.rng_seed, 7);
    }

    #[test]
    fn seed_defaults_to_wall_clock_sentinel() {
        let text = VALID.replace("RNG_SEED=7\n", "");
        assert_eq!(parsed(&text).rng_seed, 0);
    }
}
