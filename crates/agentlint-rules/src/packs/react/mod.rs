//! The `react` pack: checks on `.tsx`/`.jsx` components being written.

use std::sync::LazyLock;

use agentlint_core::{EvaluationContext, Finding, Rule, SessionState};
use regex::Regex;
use tracing::warn;

use crate::util::{WRITE_TOOLS, line_at, re, written_content};

const DEFAULT_QUERY_HOOKS: &[&str] = &["useQuery", "useSuspenseQuery"];
const LOADING_STATES: &[&str] = &["isLoading", "isPending", "isFetching"];
const ERROR_STATES: &[&str] = &["isError", "error"];

const DEFAULT_HEAVY_COMPONENTS: &[&str] = &[
    "Chart",
    "DataTable",
    "Editor",
    "Calendar",
    "Map",
    "RichTextEditor",
    "CodeEditor",
    "Spreadsheet",
];
const DEFAULT_PAGE_PATTERNS: &[&str] = &["pages/", "app/", "routes/"];

/// Bytes on either side of a `.map(` searched for a `.length` check.
const EMPTY_STATE_WINDOW: usize = 200;

static USE_MUTATION: LazyLock<Regex> = LazyLock::new(|| re(r"\buseMutation\s*\("));
static MAP_CALL: LazyLock<Regex> = LazyLock::new(|| re(r"\.map\s*\("));
static LENGTH: LazyLock<Regex> = LazyLock::new(|| re(r"\.length\b"));
static EMPTY_GUARD: LazyLock<Regex> = LazyLock::new(|| {
    re(r"&&\s*\w+\.map|\.length\s*[>!=]|\?\s*\w+\.map|\bif\s*\([^)]*\.length")
});
static LAZY: LazyLock<Regex> = LazyLock::new(|| re(r"\bReact\.lazy\b|\blazy\s*\("));
static SUSPENSE: LazyLock<Regex> = LazyLock::new(|| re(r"<Suspense\b"));

/// Path and content of a React component being written, if that is what
/// `ctx` is.
fn react_write(ctx: &EvaluationContext) -> Option<(&str, &str)> {
    if !ctx.is_tool(WRITE_TOOLS) {
        return None;
    }
    let path = ctx
        .file_path()
        .filter(|p| p.ends_with(".tsx") || p.ends_with(".jsx"))?;
    let content = written_content(ctx).filter(|c| !c.is_empty())?;
    Some((path, content))
}

/// Configured list for `key`, or `defaults` when unset or empty.
fn option_or(ctx: &EvaluationContext, rule_id: &str, key: &str, defaults: &[&str]) -> Vec<String> {
    ctx.rule_option_str_list(rule_id, key)
        .filter(|list| !list.is_empty())
        .unwrap_or_else(|| defaults.iter().map(ToString::to_string).collect())
}

/// Regex for a call or import of the identifier `name`. `None` only when
/// the configured name makes the pattern too large.
fn name_pattern(template: &str, name: &str) -> Option<Regex> {
    let pattern = template.replace("{}", &regex::escape(name));
    Regex::new(&pattern)
        .inspect_err(|e| warn!(value = name, error = %e, "ignoring configured react name"))
        .ok()
}

fn floor_boundary(s: &str, mut i: usize) -> usize {
    while !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn ceil_boundary(s: &str, mut i: usize) -> usize {
    while !s.is_char_boundary(i) {
        i += 1;
    }
    i
}

/// Warns when query hooks are used in a component that never reads their
/// loading or error flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReactQueryLoadingState;

impl Rule for ReactQueryLoadingState {
    rule_metadata! {
        id: "react-query-loading-state",
        description: "Ensures useQuery/useMutation results handle loading and error states",
        severity: Warning,
        events: [PreToolUse],
        pack: "react",
    }

    fn evaluate(&self, ctx: &EvaluationContext, _session: &mut SessionState) -> Vec<Finding> {
        let Some((path, content)) = react_write(ctx) else {
            return Vec::new();
        };
        let has_loading = LOADING_STATES.iter().any(|s| content.contains(s));
        let has_error = ERROR_STATES.iter().any(|s| content.contains(s));
        let missing = match (has_loading, has_error) {
            (false, false) => Some("loading/error"),
            (false, true) => Some("loading"),
            (true, false) => Some("error"),
            (true, true) => None,
        };

        let mut findings = Vec::new();
        if let Some(missing) = missing {
            for hook in option_or(ctx, self.id(), "hooks", DEFAULT_QUERY_HOOKS) {
                let Some(call) = name_pattern(r"\b{}\s*\(", &hook) else {
                    continue;
                };
                findings.extend(call.find_iter(content).map(|m| {
                    self.finding(format!("{hook}() without {missing} state handling"))
                        .with_file_path(Some(path))
                        .with_line(line_at(content, m.start()))
                        .with_suggestion(format!(
                            "Destructure isLoading/isPending and isError from {hook}()."
                        ))
                }));
            }
        }
        if !content.contains("isPending") {
            findings.extend(USE_MUTATION.find_iter(content).map(|m| {
                self.finding("useMutation() without isPending state handling")
                    .with_file_path(Some(path))
                    .with_line(line_at(content, m.start()))
                    .with_suggestion("Use isPending from useMutation() to disable submit buttons.")
            }));
        }
        findings
    }
}

/// Suggests an empty state for lists rendered with `.map()`. Any length
/// guard in the file counts as handling it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReactEmptyState;

impl Rule for ReactEmptyState {
    rule_metadata! {
        id: "react-empty-state",
        description: "Suggests adding empty state handling for array.map() in JSX",
        severity: Info,
        events: [PreToolUse],
        pack: "react",
    }

    fn evaluate(&self, ctx: &EvaluationContext, _session: &mut SessionState) -> Vec<Finding> {
        let Some((path, content)) = react_write(ctx) else {
            return Vec::new();
        };
        if EMPTY_GUARD.is_match(content) {
            return Vec::new();
        }

        MAP_CALL
            .find_iter(content)
            .filter(|m| {
                let start = floor_boundary(content, m.start().saturating_sub(EMPTY_STATE_WINDOW));
                let end = ceil_boundary(content, (m.end() + EMPTY_STATE_WINDOW).min(content.len()));
                !LENGTH.is_match(&content[start..end])
            })
            .map(|m| {
                self.finding(".map() without empty state handling")
                    .with_file_path(Some(path))
                    .with_line(line_at(content, m.start()))
                    .with_suggestion(
                        "Add a .length check or empty state component for when the array is empty.",
                    )
            })
            .collect()
    }
}

/// Suggests `React.lazy` for heavy components imported by page files, and
/// a `<Suspense>` boundary wherever `lazy` is used.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReactLazyLoading;

impl Rule for ReactLazyLoading {
    rule_metadata! {
        id: "react-lazy-loading",
        description: "Suggests lazy loading for heavy components in page files",
        severity: Info,
        events: [PreToolUse],
        pack: "react",
    }

    fn evaluate(&self, ctx: &EvaluationContext, _session: &mut SessionState) -> Vec<Finding> {
        let Some((path, content)) = react_write(ctx) else {
            return Vec::new();
        };
        let mut findings = Vec::new();

        let page_patterns = option_or(ctx, self.id(), "page_patterns", DEFAULT_PAGE_PATTERNS);
        if page_patterns.iter().any(|p| path.contains(p.as_str())) {
            for component in option_or(ctx, self.id(), "heavy_components", DEFAULT_HEAVY_COMPONENTS) {
                let Some(import) = name_pattern(r"(?m)^import\s+.*\b{}\b", &component) else {
                    continue;
                };
                findings.extend(import.find_iter(content).map(|m| {
                    self.finding(format!(
                        "Heavy component '{component}' imported at top level in page file"
                    ))
                    .with_file_path(Some(path))
                    .with_line(line_at(content, m.start()))
                    .with_suggestion(format!(
                        "Use React.lazy(() => import('.../{component}')) with <Suspense>."
                    ))
                }));
            }
        }

        if !SUSPENSE.is_match(content) {
            findings.extend(LAZY.find_iter(content).map(|m| {
                self.finding("React.lazy() without <Suspense> fallback")
                    .with_file_path(Some(path))
                    .with_line(line_at(content, m.start()))
                    .with_suggestion("Wrap lazy-loaded components in <Suspense fallback={...}>.")
            }));
        }
        findings
    }
}

/// Rules of the pack in evaluation order.
pub fn rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(ReactQueryLoadingState),
        Box::new(ReactEmptyState),
        Box::new(ReactLazyLoading),
    ]
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use agentlint_core::{HookEvent, RuleSettings};
    use serde_json::json;

    fn write(path: &str, content: &str) -> EvaluationContext {
        EvaluationContext::new(
            HookEvent::PreToolUse,
            "Write",
            json!({"file_path": path, "content": content}),
            ".",
        )
    }

    fn with_options(ctx: EvaluationContext, rule: &str, options: serde_json::Value) -> EvaluationContext {
        let mut config = HashMap::new();
        let _ = config.insert(rule.to_string(), RuleSettings::from(options));
        ctx.with_rule_config(config)
    }

    fn messages(rule: &dyn Rule, ctx: &EvaluationContext) -> Vec<String> {
        rule.evaluate(ctx, &mut SessionState::new())
            .into_iter()
            .map(|f| f.message)
            .collect()
    }

    fn lines(rule: &dyn Rule, ctx: &EvaluationContext) -> Vec<usize> {
        rule.evaluate(ctx, &mut SessionState::new())
            .iter()
            .filter_map(|f| f.line)
            .collect()
    }

    #[test]
    fn query_without_state_flags() {
        let content = "export function Users() {\n  const { data } = useQuery({ queryKey: ['u'] });\n  return <List items={data} />;\n}\n";
        let ctx = write("src/Users.tsx", content);
        assert_eq!(
            messages(&ReactQueryLoadingState, &ctx),
            vec!["useQuery() without loading/error state handling"]
        );
        assert_eq!(lines(&ReactQueryLoadingState, &ctx), vec![2]);

        let partial = content.replace("{ data }", "{ data, isLoading }");
        assert_eq!(
            messages(&ReactQueryLoadingState, &write("src/Users.tsx", &partial)),
            vec!["useQuery() without error state handling"]
        );

        let handled = content.replace("{ data }", "{ data, isLoading, isError }");
        assert!(messages(&ReactQueryLoadingState, &write("src/Users.tsx", &handled)).is_empty());
    }

    #[test]
    fn mutation_needs_is_pending() {
        let content = "const save = useMutation({ mutationFn });\n<button onClick={() => save.mutate()} />\n";
        assert_eq!(
            messages(&ReactQueryLoadingState, &write("Form.jsx", content)),
            vec!["useMutation() without isPending state handling"]
        );
        let handled = format!("{content}<Spinner show={{save.isPending}} />\n");
        assert!(messages(&ReactQueryLoadingState, &write("Form.jsx", &handled)).is_empty());
    }

    #[test]
    fn configured_hooks_replace_defaults() {
        let content = "const a = useQuery(q);\nconst b = useInfiniteQuery(q);\n";
        let ctx = with_options(
            write("Feed.tsx", content),
            "react-query-loading-state",
            json!({"hooks": ["useInfiniteQuery"]}),
        );
        assert_eq!(lines(&ReactQueryLoadingState, &ctx), vec![2]);
    }

    #[test]
    fn non_react_files_are_skipped() {
        let content = "const { data } = useQuery(q);\nitems.map(render);\n";
        assert!(messages(&ReactQueryLoadingState, &write("hooks.ts", content)).is_empty());
        assert!(messages(&ReactEmptyState, &write("hooks.ts", content)).is_empty());
    }

    #[test]
    fn map_without_empty_state() {
        let content = "return (\n  <ul>\n    {items.map((i) => <li key={i.id}>{i.name}</li>)}\n  </ul>\n);\n";
        let ctx = write("List.tsx", content);
        assert_eq!(messages(&ReactEmptyState, &ctx), vec![".map() without empty state handling"]);
        assert_eq!(lines(&ReactEmptyState, &ctx), vec![3]);
    }

    #[test]
    fn guarded_maps_pass() {
        for content in [
            "{items.length > 0 ? items.map(render) : <Empty />}",
            "{hasItems && items.map(render)}",
            "if (rows.length === 0) return <Empty />;\nreturn rows.map(render);",
        ] {
            assert!(messages(&ReactEmptyState, &write("List.tsx", content)).is_empty(), "{content}");
        }
    }

    #[test]
    fn window_respects_multibyte_text() {
        let content = format!("{}\n{{items.map(render)}}\n{}", "é".repeat(150), "ü".repeat(150));
        assert_eq!(lines(&ReactEmptyState, &write("List.tsx", &content)), vec![2]);

        let nearby = format!("{}\nconst n = items.length;\n{{items.map(render)}}\n", "é".repeat(150));
        assert!(lines(&ReactEmptyState, &write("List.tsx", &nearby)).is_empty());
    }

    #[test]
    fn heavy_imports_in_page_files() {
        let content = "import { Chart } from '@/components/Chart';\nimport Button from './Button';\n";
        let ctx = write("src/pages/Dashboard.tsx", content);
        assert_eq!(
            messages(&ReactLazyLoading, &ctx),
            vec!["Heavy component 'Chart' imported at top level in page file"]
        );
        assert!(messages(&ReactLazyLoading, &write("src/components/Panel.tsx", content)).is_empty());

        let custom = with_options(
            write("src/screens/Home.tsx", "import Globe from 'globe';\n"),
            "react-lazy-loading",
            json!({"page_patterns": ["screens/"], "heavy_components": ["Globe"]}),
        );
        assert_eq!(lines(&ReactLazyLoading, &custom), vec![1]);
    }

    #[test]
    fn lazy_needs_suspense() {
        let content = "const Editor = React.lazy(() => import('./Editor'));\n";
        assert_eq!(
            messages(&ReactLazyLoading, &write("src/widgets/Doc.tsx", content)),
            vec!["React.lazy() without <Suspense> fallback"]
        );
        let wrapped = format!("{content}<Suspense fallback={{<Spinner />}}><Editor /></Suspense>\n");
        assert!(messages(&ReactLazyLoading, &write("src/widgets/Doc.tsx", &wrapped)).is_empty());
    }
}
