#![no_main]

use libfuzzer_sys::fuzz_target;
use template::parser::{ParseEvent, ParseOptions, parse_events};
use template::tags::{self, TagPredicate};

const MAX_INPUT_BYTES: usize = 64 * 1024;

fuzz_target!(|data: &[u8]| {
    if data.len() > MAX_INPUT_BYTES {
        return;
    }
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let flags = data.first().copied().unwrap_or(0);
    let mut options = ParseOptions {
        should_keep_comment: flags & 1 != 0,
        output_source_range: flags & 2 != 0,
        ..ParseOptions::default()
    };
    if flags & 4 != 0 {
        options.expect_html = true;
        options.is_unary_tag = TagPredicate::new(tags::is_unary_tag);
        options.can_be_left_open_tag = TagPredicate::new(tags::can_be_left_open_tag);
    }

    let outcome = parse_events(input, &options);
    let mut depth = 0usize;
    for event in &outcome.events {
        match event {
            ParseEvent::Start { span, unary, .. } => {
                assert!(span.start <= span.end && span.end <= input.len());
                if !unary {
                    depth += 1;
                }
            }
            ParseEvent::End { span, .. } => {
                assert!(span.end <= input.len());
                depth = depth.checked_sub(1).expect("end event without open element");
            }
            ParseEvent::Chars { text, .. } => assert!(!text.is_empty()),
            ParseEvent::Comment { .. } | ParseEvent::Warn { .. } => {}
        }
    }
    assert_eq!(depth, 0, "elements left open at end of input");
});
