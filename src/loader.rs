use anyhow::Result;
use std::time::Duration;
use tokio::time::sleep;
use tracing::info;

/// Anything that can be scrolled vertically by a fixed amount.
pub trait Scroll {
    fn scroll_by(&self, delta_y: i64) -> Result<()>;
}

#[derive(Debug, Clone, Copy)]
pub struct LoadPlan {
    pub iterations: u32,
    pub delta_y: i64,
    pub settle: Duration,
}

/// Scroll `plan.iterations` times, sleeping `plan.settle` after each scroll
/// so lazily loaded cards can attach. The budget is fixed: there is no
/// early exit when the page stops growing. Errors are not caught here.
pub async fn load<S: Scroll>(session: &S, plan: LoadPlan) -> Result<()> {
    for i in 0..plan.iterations {
        info!("Scroll {}/{}...", i + 1, plan.iterations);
        session.scroll_by(plan.delta_y)?;
        sleep(plan.settle).await;
    }
    Ok(())
}
