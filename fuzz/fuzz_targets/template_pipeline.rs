#![no_main]

use std::sync::OnceLock;

use libfuzzer_sys::fuzz_target;
use template::web::{self, WebCompiler};

const MAX_INPUT_BYTES: usize = 16 * 1024;

fn compiler() -> &'static WebCompiler {
    static COMPILER: OnceLock<WebCompiler> = OnceLock::new();
    COMPILER.get_or_init(web::create_compiler)
}

fuzz_target!(|data: &[u8]| {
    if data.len() > MAX_INPUT_BYTES {
        return;
    }
    let Ok(template) = std::str::from_utf8(data) else {
        return;
    };
    let result = compiler().compile(template, None);
    assert!(!result.render.is_empty());

    let functions = compiler().compile_to_functions(template, None, None);
    let payload = serde_json::json!({ "a": 1, "b": "<x>", "c": [true, null] });
    let _ = functions.render(&payload);
});
