//! Job lifecycle commands: submit, search, launch and status.
//!
//! `submit` and `status` only need the job store, so they work before a
//! provider key is configured.

use xvulcan::pipeline::PipelineOutcome;
use xvulcan::service::submit_job;
use xvulcan::store::{ImageSelection, JobRecord};

use super::common::{job_id, parse_date, AreaArgs};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Register a new job and print its id.
pub fn run_submit(runner: &CliRunner, area: AreaArgs) -> Result<(), CliError> {
    let store = runner.store()?;
    let id = submit_job(store.as_ref(), area.start(), area.end())?;
    println!("{}", id);
    Ok(())
}

/// Search the provider catalogue for a job's area.
pub async fn run_search(
    runner: &CliRunner,
    job: &str,
    date: Option<&str>,
) -> Result<(), CliError> {
    let end = parse_date(date)?;
    let service = runner.create_service()?;
    let id = job_id(job);

    let listings = service.search_imagery(&id, end).await?;
    if listings.is_empty() {
        println!("No {} imagery found for job {}", service.provider_name(), id);
        return Ok(());
    }

    println!("{:<40} {:<28} {}", "IMAGE", "TIMESTAMP", "TYPE");
    for listing in &listings {
        println!(
            "{:<40} {:<28} {}",
            listing.id, listing.timestamp, listing.item_type
        );
    }
    println!();
    println!("{} images from {}", listings.len(), service.provider_name());
    Ok(())
}

/// Select pre/post imagery and run the assessment pipeline.
pub async fn run_launch(
    runner: &CliRunner,
    job: &str,
    pre: String,
    post: String,
    zoom: Option<u8>,
) -> Result<(), CliError> {
    let service = runner.create_service()?;
    let id = job_id(job);
    let selection = ImageSelection {
        pre_image_id: pre,
        post_image_id: post,
    };

    println!("Running assessment for job {}...", id);
    match service.launch_assessment(&id, selection, zoom).await? {
        PipelineOutcome::Completed => {
            let features = service
                .results(&id)?
                .map(|results| results.features.len())
                .unwrap_or(0);
            println!("✓ Assessment complete: {} buildings scored", features);
            Ok(())
        }
        PipelineOutcome::Failed { stage, error } => {
            eprintln!("Stage error: {}", error);
            Err(CliError::AssessmentFailed { job_id: id, stage })
        }
    }
}

/// Show one job, or every job when `job` is omitted.
pub fn run_status(runner: &CliRunner, job: Option<&str>) -> Result<(), CliError> {
    let store = runner.store()?;

    let Some(job) = job else {
        let mut ids = store.job_ids()?;
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        if ids.is_empty() {
            println!("No jobs");
        }
        for id in ids {
            let status = store.get_status(&id)?;
            println!("{:<38} {}", id, status);
        }
        return Ok(());
    };

    let record = store.record(&job_id(job))?;
    print_record(&record);
    Ok(())
}

fn print_record(record: &JobRecord) {
    println!("Job:       {}", record.uid);
    println!("Status:    {}", record.status);
    println!("Area:      {}", record.coordinates);
    println!("Created:   {}", record.created_at.to_rfc3339());
    println!("Updated:   {}", record.updated_at.to_rfc3339());
    println!("Listings:  {}", record.listings.len());

    if let Some(selection) = &record.selection {
        println!("Pre:       {}", selection.pre_image_id);
        println!("Post:      {}", selection.post_image_id);
    }
    for mosaic in &record.mosaics {
        println!(
            "Mosaic:    {} {}x{} {}",
            mosaic.tag.as_str(),
            mosaic.width,
            mosaic.height,
            mosaic.path.display()
        );
    }
    if let Some(footprints) = &record.footprints {
        println!("Buildings: {}", footprints.features.len());
    }
    if let Some(results) = &record.results {
        println!("Scored:    {}", results.features.len());
    }
}
