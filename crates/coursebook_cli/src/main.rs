//! CLI smoke entry point.
//!
//! # Responsibility
//! - Open the configured catalog store and print a deterministic summary.
//! - Exercise config, logging and mapper wiring outside of any host app.

use coursebook_core::{CatalogService, CoreConfig, PersonKind};
use log::info;
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("coursebook error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = CoreConfig::from_env()?;
    config.init_logging()?;

    let conn = config.open_store()?;
    let service = CatalogService::new(&conn);
    let categories = service.list_categories()?;
    let courses = service.list_courses()?;
    let students = service.list_people(PersonKind::Student)?;
    let teachers = service.list_people(PersonKind::Teacher)?;

    info!(
        "event=cli_summary module=cli status=ok categories={} courses={}",
        categories.len(),
        courses.len()
    );
    println!("coursebook_core version={}", coursebook_core::core_version());
    println!(
        "catalog categories={} courses={} students={} teachers={}",
        categories.len(),
        courses.len(),
        students.len(),
        teachers.len()
    );
    for course in &courses {
        let enrolled = match course.id {
            Some(id) => service.enrolled_students(id)?.len(),
            None => 0,
        };
        println!(
            "course id={} category={} enrolled={enrolled} title={}",
            course.id.unwrap_or_default(),
            course.category_id,
            course.title
        );
    }
    Ok(())
}
