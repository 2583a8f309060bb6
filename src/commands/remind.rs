use anyhow::Result;

use super::AppContext;

/// Run the daily reminder once for today
pub async fn remind(ctx: &AppContext) -> Result<()> {
    let report = ctx.reminder()?.run(ctx.clock.today()).await?;

    println!("Date: {} ({})", report.date, report.day_kind);
    match &report.schedule {
        Ok(schedule) => println!("Schedule: {} assignments created", schedule.created_count()),
        Err(e) => println!("Schedule: failed ({e})"),
    }
    println!(
        "Responder: {}",
        report.responder.as_deref().unwrap_or("(none)")
    );
    println!("Reminder: {:?}", report.reminder);
    println!("Topic: {:?}", report.topic);

    Ok(())
}
