//! Seat picker demo host.
//!
//! Loads the catalog, starts the simulated availability feed, replays a few
//! user gestures and prints the resulting seat plan.

use anyhow::Context;
use seat_picker::{
    Config, RandomAvailabilityFeed, SeatId, SeatPickerAction, SeatPickerEnvironment,
    SeatPickerReducer, SeatPickerState, SeatPlan, SeatStatus, TicketType,
};
use seat_picker_core::environment::SystemClock;
use seat_picker_runtime::Store;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type PickerStore = Store<SeatPickerState, SeatPickerAction, SeatPickerEnvironment, SeatPickerReducer>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "seat_picker=info,seat_picker_runtime=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let catalog = Arc::new(config.load_catalog().context("failed to load seat catalog")?);
    info!(seats = catalog.len(), distancing = config.distancing, "Catalog loaded");

    let feed = match config.feed.seed {
        Some(seed) => RandomAvailabilityFeed::seeded(catalog.ids(), config.feed.unavailable_ratio, seed),
        None => RandomAvailabilityFeed::new(catalog.ids(), config.feed.unavailable_ratio),
    };
    let environment = SeatPickerEnvironment::new(Arc::new(feed), Arc::new(SystemClock))
        .with_schedule(config.poll_schedule());
    let store: PickerStore = Store::new(
        SeatPickerState::with_distancing(Arc::clone(&catalog), config.distancing_policy()),
        SeatPickerReducer::new(),
        environment,
    );

    store
        .send_and_wait_for(
            SeatPickerAction::StartFeed,
            |action| matches!(action, SeatPickerAction::FeedDelivered { .. }),
            Duration::from_secs(5),
        )
        .await
        .context("availability feed did not answer")?;

    for action in gestures(&store).await {
        store.send(action).await?;
    }

    let mut actions = store.subscribe_actions();
    let next_poll = config.poll_schedule().interval + Duration::from_secs(1);
    match tokio::time::timeout(next_poll, async {
        while let Ok(action) = actions.recv().await {
            if matches!(action, SeatPickerAction::FeedDelivered { .. }) {
                break;
            }
        }
    })
    .await
    {
        Ok(()) => info!("Applied a second availability snapshot"),
        Err(_) => warn!("No second availability snapshot before the deadline"),
    }

    store.send(SeatPickerAction::StopFeed).await?;

    let (plan, labels, valid, selection) = store
        .state(|s| {
            (
                s.engine.current_seat_plan(),
                s.engine.selected_seat_labels(),
                s.engine.current_validity(),
                s.engine.current_selection().clone(),
            )
        })
        .await;

    println!("{}", render(&plan));
    println!("selected: {} (valid: {valid})", labels.join(", "));
    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "selection": selection,
            "counts": plan.counts(),
            "plan": plan,
        }))?
    );

    store.shutdown(config.shutdown_timeout()).await?;
    Ok(())
}

/// Two standard tickets and one member ticket, then four picks so the first
/// one is evicted
async fn gestures(store: &PickerStore) -> Vec<SeatPickerAction> {
    let free: Vec<SeatId> = store
        .state(|s| {
            s.engine
                .current_seat_plan()
                .entries()
                .filter(|entry| entry.status == SeatStatus::Available)
                .map(|entry| entry.seat_id)
                .take(4)
                .collect()
        })
        .await;

    let mut actions = vec![
        SeatPickerAction::EnterTicketDigits {
            ticket_type: TicketType::Standard,
            input: "2".to_string(),
        },
        SeatPickerAction::AdjustTicketCount {
            ticket_type: TicketType::Member,
            delta: 1,
        },
    ];
    actions.extend(free.into_iter().map(|seat_id| SeatPickerAction::ToggleSeat { seat_id }));
    actions
}

/// Text grid: one line per row, sections separated by a gap
fn render(plan: &SeatPlan) -> String {
    let mut lines = vec!["     . free  # selected  x taken  ~ distancing".to_string()];
    for row in &plan.rows {
        let sections: Vec<String> = row
            .sections
            .iter()
            .map(|section| {
                section
                    .entries
                    .iter()
                    .map(|entry| match entry.status {
                        SeatStatus::Available => '.',
                        SeatStatus::Selected => '#',
                        SeatStatus::Unavailable => 'x',
                        SeatStatus::Distancing => '~',
                    })
                    .collect()
            })
            .collect();
        lines.push(format!("{:>3}  {}", row.row_label, sections.join("  ")));
    }
    lines.join("\n")
}
