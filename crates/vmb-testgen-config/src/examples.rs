// crates/vmb-testgen-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration.
// Purpose: Keep the documented example file in sync with the config model.
// Dependencies: std
// ============================================================================

//! ## Overview
//! The example is static text; tests parse it with the real loader and compare
//! it with the `vmb-testgen.example.toml` checked in at the workspace root.

/// Returns the canonical example `vmb-testgen.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"# Definition files, expanded in order. JSON is canonical; RON is accepted.
[definitions]
paths = ["definitions/core.json"]

[output]
directory = "generated/vmb"
file_prefix = "bch_vmb_tests"

# External scenario compiler speaking newline-delimited JSON over stdio.
[compiler]
command = ["node", "tools/vmb-compiler.js"]
supported = ["BCH_SPEC"]
max_response_bytes = 4194304

# Generation events as JSON lines: "stderr", "file" (requires path), or "none".
[log]
sink = "stderr"
"#,
    )
}
