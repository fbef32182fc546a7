use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use template::parser::{ParseOptions, parse_events};
use template::tags::{self, TagPredicate};
use template_test_support::{diff_lines, format_events};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum FixtureStatus {
    Active,
    Xfail,
    Skip,
}

struct ExpectedEvents {
    status: FixtureStatus,
    reason: Option<String>,
    expect_html: bool,
    keep_comments: bool,
    lines: Vec<String>,
}

struct Fixture {
    name: String,
    input: String,
    expected: ExpectedEvents,
}

impl Fixture {
    fn options(&self, output_source_range: bool) -> ParseOptions {
        let mut options = ParseOptions {
            should_keep_comment: self.expected.keep_comments,
            output_source_range,
            ..ParseOptions::default()
        };
        if self.expected.expect_html {
            options.expect_html = true;
            options.is_unary_tag = TagPredicate::new(tags::is_unary_tag);
            options.can_be_left_open_tag = TagPredicate::new(tags::can_be_left_open_tag);
        }
        options
    }
}

#[test]
fn parser_golden_events() {
    let fixtures = load_fixtures();
    let filter = fixture_filter();
    let mut ran = 0usize;
    for fixture in fixtures {
        if !filter.matches(&fixture.name) {
            continue;
        }
        ran += 1;
        if fixture.expected.status == FixtureStatus::Skip {
            continue;
        }
        let actual = format_events(&parse_events(&fixture.input, &fixture.options(false)));
        enforce_expected(&fixture, &actual);
    }
    assert!(ran > 0, "no fixtures matched filter");
}

#[test]
fn parser_golden_source_ranges_do_not_change_events() {
    let filter = fixture_filter();
    for fixture in load_fixtures() {
        if !filter.matches(&fixture.name) || fixture.expected.status == FixtureStatus::Skip {
            continue;
        }
        let plain = format_events(&parse_events(&fixture.input, &fixture.options(false)));
        let ranged = format_events(&parse_events(&fixture.input, &fixture.options(true)));
        if plain != ranged {
            panic!(
                "source ranges changed events in fixture '{}'\n{}",
                fixture.name,
                diff_lines(&plain, &ranged)
            );
        }
    }
}

#[test]
fn parser_golden_tags_are_balanced() {
    let filter = fixture_filter();
    for fixture in load_fixtures() {
        if !filter.matches(&fixture.name) || fixture.expected.status != FixtureStatus::Active {
            continue;
        }
        let lines = format_events(&parse_events(&fixture.input, &fixture.options(false)));
        let mut open: Vec<String> = Vec::new();
        for line in &lines {
            if let Some(rest) = line.strip_prefix("START name=") {
                if rest.ends_with("unary=false") {
                    let name = rest.split(' ').next().unwrap_or_default();
                    open.push(name.to_string());
                }
            } else if let Some(name) = line.strip_prefix("END name=") {
                assert_eq!(
                    open.pop().as_deref(),
                    Some(name),
                    "unbalanced END in fixture '{}'",
                    fixture.name
                );
            }
        }
        assert!(open.is_empty(), "fixture '{}' left {open:?} open", fixture.name);
    }
}

fn enforce_expected(fixture: &Fixture, actual: &[String]) {
    let mismatch = actual != fixture.expected.lines;
    match fixture.expected.status {
        FixtureStatus::Active => {
            if mismatch {
                panic!(
                    "event mismatch in fixture '{}'\npath: {}\n{}",
                    fixture.name,
                    fixture_dir(&fixture.name).display(),
                    diff_lines(&fixture.expected.lines, actual)
                );
            }
        }
        FixtureStatus::Xfail => {
            if !mismatch {
                panic!(
                    "fixture '{}' matched expected events but is marked xfail; reason: {}\npath: {}",
                    fixture.name,
                    fixture.expected.reason.as_deref().unwrap_or("<missing reason>"),
                    fixture_dir(&fixture.name).display()
                );
            }
        }
        FixtureStatus::Skip => {}
    }
}

struct FixtureFilter {
    raw: Option<String>,
}

impl FixtureFilter {
    fn matches(&self, name: &str) -> bool {
        let Some(filter) = &self.raw else {
            return true;
        };
        name.contains(filter)
    }
}

fn fixture_filter() -> FixtureFilter {
    FixtureFilter {
        raw: env::var("TPLC_PARSER_FIXTURE").ok(),
    }
}

fn load_fixtures() -> Vec<Fixture> {
    let root = fixture_root();
    let mut entries: Vec<_> = fs::read_dir(&root)
        .unwrap_or_else(|err| panic!("failed to read fixture root {root:?}: {err}"))
        .filter_map(Result::ok)
        .collect();
    entries.sort_by_key(|entry| entry.file_name());

    let mut fixtures = Vec::new();
    for entry in entries {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') {
            continue;
        }
        let input_path = path.join("input.html");
        let input = fs::read_to_string(&input_path)
            .unwrap_or_else(|err| panic!("failed to read input {input_path:?}: {err}"));
        let expected = parse_events_file(&path.join("events.txt"));
        fixtures.push(Fixture {
            name,
            input,
            expected,
        });
    }
    fixtures
}

fn fixture_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("parser")
}

fn fixture_dir(name: &str) -> PathBuf {
    fixture_root().join(name)
}

fn parse_bool_header(headers: &BTreeMap<String, String>, key: &str, path: &Path) -> bool {
    match headers.get(key).map(String::as_str) {
        None | Some("false") => false,
        Some("true") => true,
        Some(other) => panic!("header '{key}' must be true or false, got '{other}' in {path:?}"),
    }
}

fn parse_events_file(path: &Path) -> ExpectedEvents {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|err| panic!("failed to read events file {path:?}: {err}"));
    let mut lines = Vec::new();
    let mut headers: BTreeMap<String, String> = BTreeMap::new();
    for raw_line in content.lines() {
        let line = raw_line.trim_end();
        if line.is_empty() {
            continue;
        }
        if let Some(stripped) = line.strip_prefix('#') {
            let header = stripped.trim();
            if header.is_empty() {
                continue;
            }
            let (key, value) = header
                .split_once(':')
                .unwrap_or_else(|| panic!("invalid header in {path:?}: '{line}'"));
            let key = key.trim().to_ascii_lowercase();
            if headers.insert(key.clone(), value.trim().to_string()).is_some() {
                panic!("duplicate header '{key}' in {path:?}");
            }
        } else {
            lines.push(line.to_string());
        }
    }

    let format = headers
        .get("format")
        .unwrap_or_else(|| panic!("missing format header in {path:?}"));
    assert_eq!(format, "template-events-v1", "unsupported format in {path:?}");

    let status = match headers.get("status").map(String::as_str) {
        Some("active") | None => FixtureStatus::Active,
        Some("xfail") => FixtureStatus::Xfail,
        Some("skip") => FixtureStatus::Skip,
        Some(other) => panic!("unsupported status '{other}' in {path:?}"),
    };
    let reason = headers.get("reason").cloned();
    if matches!(status, FixtureStatus::Xfail | FixtureStatus::Skip)
        && reason.as_deref().unwrap_or("").is_empty()
    {
        panic!("non-active fixture missing reason in {path:?}");
    }
    if lines.last().map(String::as_str) != Some("EOF") {
        panic!("events file {path:?} must end with EOF");
    }

    ExpectedEvents {
        status,
        reason,
        expect_html: parse_bool_header(&headers, "expect-html", path),
        keep_comments: parse_bool_header(&headers, "keep-comments", path),
        lines,
    }
}
