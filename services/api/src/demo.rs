use crate::infra::{
    seed_demo_directory, ConsoleNotifier, InMemoryIncidentRepository, InMemoryUserDirectory,
};
use chrono::Utc;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

use lifeline::config::DispatchConfig;
use lifeline::dispatch::{
    BloodGroup, DispatchService, EventBroadcaster, IncidentKind, IncidentSubmission, UserId,
};
use lifeline::error::AppError;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Write the rendered incident report PDF to this path
    #[arg(long)]
    pub(crate) report_out: Option<PathBuf>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let repository = Arc::new(InMemoryIncidentRepository::default());
    let directory = Arc::new(InMemoryUserDirectory::default());
    let notifier = Arc::new(ConsoleNotifier);
    let broadcaster = EventBroadcaster::default();
    let config = DispatchConfig::default();

    seed_demo_directory(&directory);

    let service = DispatchService::new(
        repository,
        directory,
        notifier,
        broadcaster.clone(),
        config,
    );

    println!("LifeLine dispatch demo");
    println!("run at {}", Utc::now().format("%Y-%m-%d %H:%M UTC"));
    println!("======================");

    let mut events = broadcaster.subscribe();

    let reporter = UserId("user-asha".to_string());
    let view = service.create_incident(
        &reporter,
        IncidentSubmission {
            kind: IncidentKind::BloodRequest,
            description: Some("urgent O- transfusion needed".to_string()),
            latitude: 22.5726,
            longitude: 88.3639,
            blood_group: Some(BloodGroup::ONegative),
        },
    )?;

    println!("\nIncident {} raised by {}", view.id, reporter);
    println!(
        "  kind: {}  priority: {}  status: {}",
        view.kind.label(),
        view.priority_score,
        view.status.label()
    );
    println!(
        "  reported at: {}",
        view.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    let eligible = service.nearby_responders(
        view.location.latitude,
        view.location.longitude,
        Some(10.0),
        view.blood_group,
    )?;
    println!("\nEligible responders within 10 km:");
    for candidate in &eligible {
        println!(
            "  {} ({}) at {:.2} km",
            candidate.name,
            candidate.role.label(),
            candidate.distance_km
        );
    }

    let after_donor = service.respond(&view.id, &UserId("donor-ravi".to_string()))?;
    let after_hospital = service.respond(&view.id, &UserId("hospital-city".to_string()))?;
    println!(
        "\nAcknowledgements recorded: {} -> {}",
        after_donor.responders.len(),
        after_hospital.responders.len()
    );

    println!("\nTimeline:");
    for entry in &after_hospital.timeline {
        println!(
            "  [{}] {} - {}",
            entry.timestamp.format("%H:%M:%S"),
            entry.status,
            entry.details.as_deref().unwrap_or("-")
        );
    }

    println!("\nBroadcast events:");
    while let Ok(event) = events.try_recv() {
        let tag = serde_json::to_value(&event)
            .ok()
            .and_then(|value| value["event"].as_str().map(str::to_string))
            .unwrap_or_else(|| "unknown".to_string());
        println!("  {tag}");
    }

    if let Some(path) = args.report_out {
        let bytes = service.render_report(&view.id)?;
        std::fs::write(&path, &bytes)?;
        println!("\nIncident report written to {}", path.display());
    }

    Ok(())
}
