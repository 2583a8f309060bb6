use anyhow::Result;

use dangbeon::scheduler::ScheduleReport;

use super::AppContext;

/// Create next month's assignments, or preview them with `dry_run`
pub async fn schedule(ctx: &AppContext, dry_run: bool) -> Result<()> {
    let today = ctx.clock.today();
    let report = if dry_run {
        ctx.scheduler.preview_next_month(today).await?
    } else {
        ctx.scheduler.schedule_next_month(today).await?
    };

    match &report {
        ScheduleReport::Created(plan) => {
            println!(
                "Created {} assignments for {}-{:02}:",
                plan.assignments.len(),
                plan.year,
                plan.month
            );
            println!("{}", ctx.scheduler.format_plan(plan));
        }
        ScheduleReport::Planned(plan) => {
            println!(
                "Dry run: {} assignments would be created for {}-{:02}:",
                plan.assignments.len(),
                plan.year,
                plan.month
            );
            println!("{}", ctx.scheduler.format_plan(plan));
        }
        ScheduleReport::NoOp(reason) => println!("Nothing to schedule: {reason}"),
    }

    Ok(())
}
