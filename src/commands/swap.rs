use anyhow::Result;

use dangbeon::error::Error;
use dangbeon::notifications::messages;
use dangbeon::swap::{SwapCommand, SwapCoordinator};

use super::AppContext;

/// Swap two responders' nearest upcoming assignments and print the result
pub async fn swap(ctx: &AppContext, first: &str, second: &str) -> Result<()> {
    let command = match SwapCommand::parse(&format!("{first} {second}")) {
        Ok(command) => command,
        Err(e) => anyhow::bail!("{}", Error::from(e).korean_desc()),
    };

    let coordinator = SwapCoordinator::new(ctx.repo.clone());
    match coordinator
        .swap(&command.first, &command.second, ctx.clock.today())
        .await
    {
        Ok(outcome) => {
            println!("{}", messages::swap_success(&outcome, ctx.clock.now()).plain_text());
            Ok(())
        }
        Err(e) => {
            println!("{}", messages::swap_failure(&e).plain_text());
            let error = Error::from(e);
            tracing::error!(category = ?error.category(), recoverable = error.is_recoverable(), "Swap failed");
            Err(error.into())
        }
    }
}
