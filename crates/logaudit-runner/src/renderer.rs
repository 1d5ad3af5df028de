use crate::RunSummary;
use crate::worker::{FileOutcome, FileReport};
use ascii_tree::{Tree, write_tree};

/// Renders a `RunSummary` into a human-readable ASCII tree.
///
/// One node per scanned file with its diagnostic counts, so an operator
/// can see at a glance which logs need a closer look in the output file.
pub fn render_summary_as_tree(summary: &RunSummary) -> Result<String, std::fmt::Error> {
    let root_label = format!(
        "{} ({} files, {} warnings, {} errors, {} failed)",
        summary.logs_dir.display(),
        summary.files.len(),
        summary.total_warnings(),
        summary.total_errors(),
        summary.failed_count()
    );

    let file_nodes = summary.files.iter().map(render_file_node).collect();

    let tree = Tree::Node(root_label, file_nodes);
    let mut buffer = String::new();
    write_tree(&mut buffer, &tree)?;
    Ok(buffer)
}

fn render_file_node(report: &FileReport) -> Tree {
    let status_icon = match &report.outcome {
        FileOutcome::Completed if report.warnings + report.errors == 0 => "✅",
        FileOutcome::Completed => "⚠️",
        FileOutcome::Cancelled => "⏹️",
        FileOutcome::Failed { .. } => "❌",
    };
    let label = format!("{} {}", status_icon, report.source_file);

    let detail = match &report.outcome {
        FileOutcome::Failed { error } => vec![format!("Error: {error}")],
        outcome => {
            let mut lines = vec![
                format!("Lines: {}", report.lines_read),
                format!(
                    "Info: {}  Warnings: {}  Errors: {}",
                    report.info, report.warnings, report.errors
                ),
            ];
            if *outcome == FileOutcome::Cancelled {
                lines.push("Cancelled before end of file".to_string());
            }
            lines
        }
    };

    Tree::Node(label, vec![Tree::Leaf(detail)])
}
