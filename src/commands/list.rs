use anyhow::Result;
use chrono::Duration;

use dangbeon::notifications::messages;
use dangbeon::scheduler::DEFAULT_LOOKAHEAD_DAYS;

use super::AppContext;

/// Print assignments from today through the lookahead window
pub async fn list(ctx: &AppContext) -> Result<()> {
    let today = ctx.clock.today();
    let rows = ctx
        .repo
        .list_between(today, today + Duration::days(DEFAULT_LOOKAHEAD_DAYS))
        .await?;

    println!("{}", messages::schedule_list(&rows, ctx.clock.now()).plain_text());
    Ok(())
}
