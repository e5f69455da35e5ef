pub const RUNNING_MESSAGE: &str = "Form feedback relay is running";

/// GET /: liveness check.
pub async fn index() -> &'static str {
    RUNNING_MESSAGE
}
