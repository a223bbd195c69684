//! The schema shipped with the `warden` binary.
use serde_json::{Value, json};

use super::{ManagedEntry, Schema, Source};
use crate::context::ProjectContext;
use crate::resources::patch::Marker;

/// Version of the built-in schema.
pub const VERSION: semver::Version = semver::Version::new(1, 4, 0);

const GUIDES_DIR: &str = ".warden/guides";
const HOOKS_DIR: &str = ".warden/hooks";
const GUARD_HOOK: &str = ".warden/hooks/guard-paths.sh";
const FORMAT_HOOK: &str = ".warden/hooks/format.sh";

const CLAUDE_MARKER: &str = "<!-- warden:guides -->";
const AGENTS_BEGIN: &str = "<!-- warden:begin -->";
const AGENTS_END: &str = "<!-- warden:end -->";
const GITIGNORE_BEGIN: &str = "# warden:begin";
const GITIGNORE_END: &str = "# warden:end";

const GUARD_HOOK_SCRIPT: &str = r#"#!/bin/sh
# managed-by: warden
# Blocks agent edits to paths the project marks as protected.
set -eu

input=$(cat)
for protected in .env .env.local .git/ .warden/version; do
  case "$input" in
    *"\"file_path\":\"$protected"*|*"\"file_path\": \"$protected"*)
      echo "warden: refusing to touch protected path $protected" >&2
      exit 2
      ;;
  esac
done
exit 0
"#;

const ESLINT_CONFIG: &str = r#"// managed-by: warden
import js from "@eslint/js";

export default [
  js.configs.recommended,
  {
    ignores: ["dist/**", "build/**", "coverage/**", ".warden/**"],
  },
];
"#;

const RUFF_CONFIG: &str = r#"# managed-by: warden
line-length = 100
target-version = "py311"

[lint]
select = ["E", "F", "I", "B", "UP"]
"#;

fn uses_javascript(ctx: &ProjectContext) -> bool {
    ctx.languages.javascript || ctx.languages.typescript
}

fn uses_python(ctx: &ProjectContext) -> bool {
    ctx.languages.python || ctx.has_pack("python")
}

fn has_claude_md(ctx: &ProjectContext) -> bool {
    ctx.has_document("CLAUDE.md")
}

fn has_agents_md(ctx: &ProjectContext) -> bool {
    ctx.has_document("AGENTS.md")
}

fn has_tracked_gitignore(ctx: &ProjectContext) -> bool {
    ctx.in_git && ctx.has_document(".gitignore")
}

fn guides_index(ctx: &ProjectContext) -> String {
    let mut out = String::from("<!-- managed-by: warden -->\n# Project guides\n\n");
    out.push_str("Conventions for agents and contributors working in this repository.\n\n");
    if uses_javascript(ctx) {
        out.push_str("- [JavaScript](javascript.md)\n");
    }
    if uses_python(ctx) {
        out.push_str("- [Python](python.md)\n");
    }
    if ctx.languages.go {
        out.push_str("- Go: run `go vet ./...` and `go test ./...` before committing.\n");
    }
    if ctx.languages.rust {
        out.push_str("- Rust: run `cargo clippy` and `cargo test` before committing.\n");
    }
    out
}

fn javascript_guide(ctx: &ProjectContext) -> String {
    let pm = ctx.package_manager.map_or("npm", |pm| pm.command());
    let language = if ctx.languages.typescript {
        "TypeScript"
    } else {
        "JavaScript"
    };
    let mut out = format!("<!-- managed-by: warden -->\n# {language}\n\n");
    out.push_str(&format!("- Install dependencies with `{pm} install`.\n"));
    out.push_str(&format!("- Run the test suite with `{pm} test`.\n"));
    out.push_str("- Formatting is enforced by the `format.sh` hook (prettier).\n");
    let frameworks: Vec<&str> = ["react", "next", "vue", "svelte", "angular", "express"]
        .into_iter()
        .filter(|f| ctx.has_framework(f))
        .collect();
    if !frameworks.is_empty() {
        out.push_str(&format!("- Frameworks in use: {}.\n", frameworks.join(", ")));
    }
    out
}

fn python_guide(ctx: &ProjectContext) -> String {
    let mut out = String::from("<!-- managed-by: warden -->\n# Python\n\n");
    out.push_str("- Lint with `ruff check .` and format with `ruff format .`.\n");
    if ctx.has_framework("pytest") {
        out.push_str("- Run the test suite with `pytest`.\n");
    }
    for framework in ["django", "flask", "fastapi"] {
        if ctx.has_framework(framework) {
            out.push_str(&format!("- Follow {framework} project conventions.\n"));
        }
    }
    out
}

fn format_hook(ctx: &ProjectContext) -> String {
    let runner = match ctx.package_manager.map(|pm| pm.command()) {
        Some("pnpm") => "pnpm exec",
        Some("yarn") => "yarn",
        Some("bun") => "bunx",
        _ => "npx",
    };
    format!(
        "#!/bin/sh\n# managed-by: warden\n# Formats files after an agent edits them.\nset -eu\n\n{runner} prettier --write --ignore-unknown \"$@\"\n"
    )
}

fn project_rules(ctx: &ProjectContext) -> String {
    let mut out = String::from(
        "---\ndescription: Project conventions\nalwaysApply: true\n---\n<!-- managed-by: warden -->\n\n",
    );
    out.push_str("- Read `.warden/guides/README.md` before making changes.\n");
    out.push_str("- Never edit files under `.warden/`; they are regenerated.\n");
    if !ctx.frameworks.is_empty() {
        let names: Vec<&str> = ctx.frameworks.iter().map(String::as_str).collect();
        out.push_str(&format!("- Detected frameworks: {}.\n", names.join(", ")));
    }
    out
}

fn hook_command(path: &str) -> Value {
    json!({ "type": "command", "command": path })
}

fn claude_settings(ctx: &ProjectContext) -> Value {
    let mut hooks = json!({
        "PreToolUse": [
            { "matcher": "Edit|Write", "hooks": [hook_command(GUARD_HOOK)] }
        ]
    });
    if uses_javascript(ctx)
        && let Some(map) = hooks.as_object_mut()
    {
        map.insert(
            "PostToolUse".to_string(),
            json!([{ "matcher": "Edit|Write", "hooks": [hook_command(FORMAT_HOOK)] }]),
        );
    }
    json!({ "hooks": hooks })
}

fn agents_block(_ctx: &ProjectContext) -> String {
    format!(
        "{AGENTS_BEGIN}\nProject guides live in `{GUIDES_DIR}/README.md`.\nHooks in `{HOOKS_DIR}/` guard protected paths.\n{AGENTS_END}"
    )
}

fn gitignore_block(_ctx: &ProjectContext) -> String {
    format!("{GITIGNORE_BEGIN}\n.warden/cache/\n{GITIGNORE_END}")
}

/// Build the built-in schema.
#[must_use]
pub fn schema() -> Schema {
    Schema::new(VERSION)
        .with(ManagedEntry::write_file(
            ".warden/guides/README.md",
            Source::Render(guides_index),
        ))
        .with(
            ManagedEntry::write_file(".warden/guides/javascript.md", Source::Render(javascript_guide))
                .when(uses_javascript),
        )
        .with(
            ManagedEntry::write_file(".warden/guides/python.md", Source::Render(python_guide))
                .when(uses_python),
        )
        .with(ManagedEntry::write_file(GUARD_HOOK, GUARD_HOOK_SCRIPT))
        .with(ManagedEntry::chmod(GUARD_HOOK, true))
        .with(
            ManagedEntry::write_file(FORMAT_HOOK, Source::Render(format_hook))
                .when(uses_javascript)
                .requires_package("prettier"),
        )
        .with(ManagedEntry::chmod(FORMAT_HOOK, true).when(uses_javascript))
        .with(ManagedEntry::write_file(
            ".warden/rules/project.mdc",
            Source::Render(project_rules),
        ))
        .with(ManagedEntry::json_merge(
            ".claude/settings.json",
            Source::Render(claude_settings),
        ))
        .with(
            ManagedEntry::text_patch(
                "CLAUDE.md",
                Marker::line(CLAUDE_MARKER),
                format!("{CLAUDE_MARKER} See `{GUIDES_DIR}/README.md` for project guides."),
            )
            .when(has_claude_md),
        )
        .with(
            ManagedEntry::text_patch(
                "AGENTS.md",
                Marker::block(AGENTS_BEGIN, AGENTS_END),
                Source::Render(agents_block),
            )
            .when(has_agents_md),
        )
        .with(
            ManagedEntry::text_patch(
                ".gitignore",
                Marker::block(GITIGNORE_BEGIN, GITIGNORE_END),
                Source::Render(gitignore_block),
            )
            .when(has_tracked_gitignore),
        )
        .with(
            ManagedEntry::write_file(".warden/lint/eslint.config.mjs", ESLINT_CONFIG)
                .when(uses_javascript)
                .full_only()
                .requires_package("eslint")
                .requires_package("@eslint/js"),
        )
        .with(
            ManagedEntry::write_file(".warden/lint/ruff.toml", RUFF_CONFIG)
                .when(uses_python)
                .full_only(),
        )
}
