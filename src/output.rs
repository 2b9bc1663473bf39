//! Report rendering: console, JSON, and HTML views of a finished run.

use std::collections::HashMap;
use std::path::PathBuf;

use console::Style;

use crate::mutants::{MutationResult, MutationStatus, Stats};
use crate::runner;

pub fn print_error(msg: &str) {
    let style = Style::new().red().bold();
    eprintln!("{} {}", style.apply_to("✗"), msg);
}

pub fn print_success(msg: &str) {
    let style = Style::new().green().bold();
    println!("{} {}", style.apply_to("✓"), msg);
}

pub fn print_warning(msg: &str) {
    let style = Style::new().yellow().bold();
    eprintln!("{} {}", style.apply_to("!"), msg);
}

/// One line per completed mutation, in completion order, on stderr so the
/// json/html report stream stays clean on stdout.
pub fn print_progress(done: usize, total: usize, result: &MutationResult) {
    let style = match result.status {
        MutationStatus::Killed => Style::new().green(),
        MutationStatus::Survived => Style::new().red(),
        MutationStatus::Timeout => Style::new().yellow(),
        MutationStatus::Error => Style::new().magenta(),
        MutationStatus::Pending => Style::new().dim(),
    };
    let m = &result.mutation;
    eprintln!(
        "  [{done}/{total}] {} {}:{} ({})",
        style.apply_to(result.status.to_string()),
        m.file.display(),
        m.location.start_line,
        m.operator_name,
    );
}

fn score_style(score: f64) -> Style {
    if score >= 80.0 {
        Style::new().green().bold()
    } else if score >= 50.0 {
        Style::new().yellow().bold()
    } else {
        Style::new().red().bold()
    }
}

/// Unified-style `- old` / `+ new` line diff of the original against the
/// mutated source.
pub fn generate_diff(original: &str, mutated: &str) -> String {
    use similar::TextDiff;
    let diff = TextDiff::from_lines(original, mutated);
    let mut output = String::new();
    for change in diff.iter_all_changes() {
        match change.tag() {
            similar::ChangeTag::Delete => {
                output.push_str(&format!("- {change}"));
            }
            similar::ChangeTag::Insert => {
                output.push_str(&format!("+ {change}"));
            }
            _ => {}
        }
    }
    output
}

/// Console report: colored score, the status counts, total time, and one
/// line per surviving mutation. Verbose mode adds a diff per survivor.
pub fn print_console_report(
    stats: &Stats,
    results: &[MutationResult],
    sources: &HashMap<PathBuf, String>,
    verbose: bool,
) {
    let score = stats.score();
    let style = score_style(score);

    println!();
    println!("Mutation testing report");
    println!("  score:     {}", style.apply_to(format!("{score:.1}%")));
    println!("  total:     {}", stats.total);
    println!("  killed:    {}", stats.killed);
    println!("  survived:  {}", stats.survived);
    println!("  timed out: {}", stats.timed_out);
    println!("  errors:    {}", stats.errors);
    println!(
        "  time:      {:.1}s",
        stats.total_time_ms as f64 / 1000.0
    );

    let survivors: Vec<_> = results
        .iter()
        .filter(|r| r.status == MutationStatus::Survived)
        .collect();
    if survivors.is_empty() {
        return;
    }

    println!();
    println!("Surviving mutations:");
    let dim = Style::new().dim();
    let op_style = Style::new().magenta();
    for result in survivors {
        let m = &result.mutation;
        println!(
            "  {}:{}:{} - {} {}",
            m.file.display(),
            m.location.start_line,
            m.location.start_col,
            op_style.apply_to(&m.operator_name),
            dim.apply_to(&m.description),
        );
        if verbose {
            if let Some(original) = sources.get(&m.file) {
                let mutated = runner::apply_mutation(original, m);
                for line in generate_diff(original, &mutated).lines() {
                    if line.starts_with('-') {
                        println!("    {}", Style::new().red().apply_to(line));
                    } else if line.starts_with('+') {
                        println!("    {}", Style::new().green().apply_to(line));
                    }
                }
            }
        }
    }
}

/// JSON report, schema v1.0. The score is serialized as its string
/// representation to sidestep float-format ambiguity in CI consumers.
pub fn render_json(stats: &Stats, results: &[MutationResult]) -> String {
    let mutations: Vec<serde_json::Value> = results
        .iter()
        .map(|r| {
            let m = &r.mutation;
            serde_json::json!({
                "mutation": {
                    "id": m.id,
                    "file": m.file.display().to_string(),
                    "location": {
                        "file": m.location.file.display().to_string(),
                        "startLine": m.location.start_line,
                        "startCol": m.location.start_col,
                        "endLine": m.location.end_line,
                        "endCol": m.location.end_col,
                    },
                    "original": m.original_text,
                    "mutated": m.mutated_text,
                    "operator": m.operator_name,
                },
                "status": r.status.to_string(),
                "duration": r.duration_ms,
                "message": r.message,
            })
        })
        .collect();

    let report = serde_json::json!({
        "version": "1.0",
        "generator": "LeanMutator",
        "stats": {
            "total": stats.total,
            "killed": stats.killed,
            "survived": stats.survived,
            "timedOut": stats.timed_out,
            "errors": stats.errors,
            "score": format!("{:.2}", stats.score()),
            "totalTime": stats.total_time_ms,
        },
        "mutations": mutations,
    });
    serde_json::to_string_pretty(&report).unwrap_or_else(|_| "{}".to_string())
}

pub fn html_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn status_class(status: MutationStatus) -> &'static str {
    match status {
        MutationStatus::Pending => "pending",
        MutationStatus::Killed => "killed",
        MutationStatus::Survived => "survived",
        MutationStatus::Timeout => "timeout",
        MutationStatus::Error => "error",
    }
}

/// Self-contained HTML report: inline stylesheet and script, a stat grid,
/// and an accordion of mutation entries colored by status. No external
/// asset loads.
pub fn render_html(stats: &Stats, results: &[MutationResult]) -> String {
    let score = stats.score();
    let score_class = if score >= 80.0 {
        "good"
    } else if score >= 50.0 {
        "warn"
    } else {
        "bad"
    };

    let mut entries = String::new();
    for r in results {
        let m = &r.mutation;
        entries.push_str(&format!(
            concat!(
                "<details class=\"entry {status}\">",
                "<summary><span class=\"badge\">{status}</span> ",
                "<code>{file}:{line}:{col}</code> {operator} ",
                "<span class=\"desc\">{description}</span></summary>",
                "<div class=\"body\">",
                "<div class=\"code\"><h4>Original</h4><pre>{original}</pre></div>",
                "<div class=\"code\"><h4>Mutated</h4><pre>{mutated}</pre></div>",
                "{message}",
                "</div></details>\n"
            ),
            status = status_class(r.status),
            file = html_escape(&m.file.display().to_string()),
            line = m.location.start_line,
            col = m.location.start_col,
            operator = html_escape(&m.operator_name),
            description = html_escape(&m.description),
            original = html_escape(&m.original_text),
            mutated = html_escape(&m.mutated_text),
            message = if r.message.is_empty() {
                String::new()
            } else {
                format!("<p class=\"msg\">{}</p>", html_escape(&r.message))
            },
        ));
    }

    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>LeanMutator report</title>
<style>
body {{ font-family: -apple-system, 'Segoe UI', sans-serif; margin: 2rem auto; max-width: 60rem; color: #222; }}
h1 {{ font-size: 1.4rem; }}
.grid {{ display: grid; grid-template-columns: repeat(auto-fit, minmax(8rem, 1fr)); gap: 0.8rem; margin: 1.2rem 0; }}
.stat {{ border: 1px solid #ddd; border-radius: 6px; padding: 0.8rem; text-align: center; }}
.stat .num {{ font-size: 1.6rem; font-weight: 700; display: block; }}
.stat.good .num {{ color: #1a7f37; }}
.stat.warn .num {{ color: #9a6700; }}
.stat.bad .num {{ color: #cf222e; }}
.entry {{ border: 1px solid #ddd; border-left-width: 4px; border-radius: 4px; margin: 0.4rem 0; padding: 0.2rem 0.6rem; }}
.entry.killed {{ border-left-color: #1a7f37; }}
.entry.survived {{ border-left-color: #cf222e; }}
.entry.timeout {{ border-left-color: #9a6700; }}
.entry.error {{ border-left-color: #8250df; }}
.entry summary {{ cursor: pointer; }}
.badge {{ font-size: 0.75rem; text-transform: uppercase; font-weight: 700; margin-right: 0.4rem; }}
.entry.killed .badge {{ color: #1a7f37; }}
.entry.survived .badge {{ color: #cf222e; }}
.entry.timeout .badge {{ color: #9a6700; }}
.entry.error .badge {{ color: #8250df; }}
.desc {{ color: #666; font-size: 0.85rem; }}
.body {{ display: flex; gap: 1rem; padding: 0.6rem 0; flex-wrap: wrap; }}
.code {{ flex: 1 1 16rem; }}
.code h4 {{ margin: 0 0 0.3rem; font-size: 0.8rem; color: #666; }}
.code pre {{ background: #f6f8fa; border-radius: 4px; padding: 0.5rem; overflow-x: auto; margin: 0; }}
.msg {{ color: #8250df; font-size: 0.85rem; flex-basis: 100%; }}
</style>
</head>
<body>
<h1>LeanMutator report</h1>
<div class="grid">
<div class="stat {score_class}"><span class="num">{score:.1}%</span>score</div>
<div class="stat"><span class="num">{total}</span>total</div>
<div class="stat good"><span class="num">{killed}</span>killed</div>
<div class="stat bad"><span class="num">{survived}</span>survived</div>
<div class="stat warn"><span class="num">{timed_out}</span>timed out</div>
<div class="stat"><span class="num">{errors}</span>errors</div>
<div class="stat"><span class="num">{time:.1}s</span>time</div>
</div>
{entries}
<script>
// Expand all surviving entries by default; they are the actionable ones.
document.querySelectorAll('details.survived').forEach(d => d.open = true);
</script>
</body>
</html>
"##,
        score = score,
        score_class = score_class,
        total = stats.total,
        killed = stats.killed,
        survived = stats.survived,
        timed_out = stats.timed_out,
        errors = stats.errors,
        time = stats.total_time_ms as f64 / 1000.0,
        entries = entries,
    )
}
