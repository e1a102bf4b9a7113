pub mod attach;
pub mod auth;
pub mod restore;
pub mod snapshot;
pub mod volume;

use colored::Colorize;
use diskflow_cloud::OperationFailure;

/// Print what a failed operation had done and how the undo went, then
/// hand back the original error.
pub fn report_failure(failure: OperationFailure) -> anyhow::Error {
    if !failure.completed.is_empty() {
        eprintln!("{}", "ロールバック対象:".yellow());
        for step in &failure.completed {
            eprintln!("  • {}", step);
        }
    }
    if failure.fully_compensated() {
        if !failure.completed.is_empty() {
            eprintln!("{}", "✓ ロールバック完了".green());
        }
    } else {
        eprintln!(
            "{}",
            "⚠ ロールバックに失敗しました。リソースが残っている可能性があります:"
                .red()
                .bold()
        );
        for error in &failure.compensation_errors {
            eprintln!("  • {}", error);
        }
    }
    failure.into_error().into()
}
